//! Main logger implementation

use super::{
    appender::Appender,
    error::{stderr_diagnostics, DiagnosticCallback, Result},
    log_context::{FieldValue, LogContext},
    log_level::LogLevel,
    notifier::{self, Notifier},
    writer::{LogWriter, LogWriterBuilder},
};
use crate::config::{LogConfig, ResolvedConfig, StreamConfig};
use crate::notify::NotificationSink;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

struct LoggerInner {
    context: RwLock<LogContext>,
    writer: LogWriter,
    notification_sink: Option<Arc<NotificationSink>>,
    /// Every background destination, the notification sink first.
    notifiers: Vec<Arc<dyn Notifier>>,
    on_diagnostic: DiagnosticCallback,
}

/// Context-carrying logger.
///
/// Every call merges the stored context with the call's extra fields, writes
/// the result (minus the `slack` routing key) synchronously to the primary
/// writer, then hands the full context to each notifier in the background.
///
/// Cloning a `Logger` yields another handle to the *same* instance, so
/// [`set_context`](Self::set_context) through one clone is visible through
/// all of them. Use [`child`](Self::child) for an independent instance.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_scoped_logger::prelude::*;
    ///
    /// let memory = MemoryAppender::new();
    /// let logger = Logger::builder("checkout")
    ///     .stream(LogLevel::Info, memory.clone())
    ///     .build();
    ///
    /// logger.set_context("userId", "123");
    /// logger.info("order placed");
    ///
    /// let records = memory.records();
    /// let record = &records[0];
    /// assert_eq!(record.msg, "order placed");
    /// assert_eq!(record.fields.get("userId"), Some(&FieldValue::from("123")));
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    /// Build a logger for the environment named by `APP_ENV`.
    pub fn from_config(config: &LogConfig) -> Result<Self> {
        Self::from_resolved(&config.resolve_current()?)
    }

    /// Build a logger for an explicit environment.
    pub fn from_config_for(config: &LogConfig, environment: &str) -> Result<Self> {
        Self::from_resolved(&config.resolve(environment)?)
    }

    pub fn from_resolved(resolved: &ResolvedConfig) -> Result<Self> {
        Self::from_resolved_with(resolved, stderr_diagnostics())
    }

    /// Build a logger from resolved configuration, reporting writer and
    /// notification failures to `on_diagnostic`.
    ///
    /// Every stream descriptor is validated and the notification client is
    /// built before the logger exists; any failure leaves nothing behind.
    pub fn from_resolved_with(
        resolved: &ResolvedConfig,
        on_diagnostic: DiagnosticCallback,
    ) -> Result<Self> {
        let mut builder = Self::builder(&resolved.name)
            .on_diagnostic(Arc::clone(&on_diagnostic))
            .stream_configs(&resolved.streams)?;

        if let Some(notification) = &resolved.notification {
            let sink = NotificationSink::from_config(notification.clone())?
                .with_diagnostics(on_diagnostic);
            builder = builder.notification_sink(sink);
        }

        Ok(builder.build())
    }

    pub fn name(&self) -> &str {
        self.inner.writer.name()
    }

    /// Set one context key, overwriting any previous value.
    ///
    /// Returns `self` so calls can be chained.
    pub fn set_context(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> &Self {
        self.inner.context.write().add_field(key, value);
        self
    }

    /// Remove one context key, returning its value if it was set.
    pub fn remove_context(&self, key: &str) -> Option<FieldValue> {
        self.inner.context.write().remove(key)
    }

    /// Snapshot of the current context
    pub fn context(&self) -> LogContext {
        self.inner.context.read().clone()
    }

    /// Derive an independent logger.
    ///
    /// The child starts from a copy of this logger's context merged with
    /// `bound` (bound wins), shares this logger's notifiers, and writes through
    /// a child writer carrying `bound` on every record. Later `set_context`
    /// calls on either side are not seen by the other.
    #[must_use]
    pub fn child(&self, bound: LogContext) -> Logger {
        let context = self.inner.context.read().merged(&bound);
        Logger {
            inner: Arc::new(LoggerInner {
                context: RwLock::new(context),
                writer: self.inner.writer.child(&bound.without_route()),
                notification_sink: self.inner.notification_sink.clone(),
                notifiers: self.inner.notifiers.clone(),
                on_diagnostic: Arc::clone(&self.inner.on_diagnostic),
            }),
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(level, &message.into(), None);
    }

    /// Log with extra fields for this call only; `extra` wins over the stored
    /// context on key collision.
    pub fn log_with_context(&self, level: LogLevel, message: impl Into<String>, extra: LogContext) {
        self.emit(level, &message.into(), Some(&extra));
    }

    fn emit(&self, level: LogLevel, message: &str, extra: Option<&LogContext>) {
        let full = {
            let context = self.inner.context.read();
            match extra {
                Some(extra) => context.merged(extra),
                None => context.clone(),
            }
        };

        self.inner.writer.write(level, &full.without_route(), message);

        if !self.inner.notifiers.is_empty() {
            notifier::dispatch(
                &self.inner.notifiers,
                level,
                message,
                &full,
                &self.inner.on_diagnostic,
            );
        }
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    pub fn trace_with_context(&self, message: impl Into<String>, extra: LogContext) {
        self.log_with_context(LogLevel::Trace, message, extra);
    }

    pub fn debug_with_context(&self, message: impl Into<String>, extra: LogContext) {
        self.log_with_context(LogLevel::Debug, message, extra);
    }

    /// Helper for structured info logging
    pub fn info_with_context(&self, message: impl Into<String>, extra: LogContext) {
        self.log_with_context(LogLevel::Info, message, extra);
    }

    pub fn warn_with_context(&self, message: impl Into<String>, extra: LogContext) {
        self.log_with_context(LogLevel::Warn, message, extra);
    }

    /// Helper for structured error logging
    pub fn error_with_context(&self, message: impl Into<String>, extra: LogContext) {
        self.log_with_context(LogLevel::Error, message, extra);
    }

    pub fn fatal_with_context(&self, message: impl Into<String>, extra: LogContext) {
        self.log_with_context(LogLevel::Fatal, message, extra);
    }

    pub fn writer(&self) -> &LogWriter {
        &self.inner.writer
    }

    pub fn notification_sink(&self) -> Option<&Arc<NotificationSink>> {
        self.inner.notification_sink.as_ref()
    }

    pub fn notifiers(&self) -> &[Arc<dyn Notifier>] {
        &self.inner.notifiers
    }

    pub fn flush(&self) -> Result<()> {
        self.inner.writer.flush()
    }

    /// Whether both handles refer to the same logger instance
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("context", &*self.inner.context.read())
            .field("notifiers", &self.inner.notifiers.len())
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_scoped_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder("worker")
///     .stream(LogLevel::Debug, ConsoleAppender::new())
///     .context_field("region", "eu-west-1")
///     .on_diagnostic(Arc::new(|err: &LoggerError| {
///         eprintln!("logger failure: {}", err);
///     }))
///     .build();
///
/// logger.debug("Starting");
/// ```
pub struct LoggerBuilder {
    writer: LogWriterBuilder,
    context: LogContext,
    notification_sink: Option<Arc<NotificationSink>>,
    notifiers: Vec<Arc<dyn Notifier>>,
    on_diagnostic: Option<DiagnosticCallback>,
}

impl LoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            writer: LogWriterBuilder::new(name),
            context: LogContext::new(),
            notification_sink: None,
            notifiers: Vec::new(),
            on_diagnostic: None,
        }
    }

    /// Add a primary appender receiving records at `level` and above
    #[must_use = "builder methods return a new value"]
    pub fn stream<A: Appender + 'static>(mut self, level: LogLevel, appender: A) -> Self {
        self.writer = self.writer.stream(level, appender);
        self
    }

    /// Add primary streams from configuration descriptors
    pub fn stream_configs(mut self, configs: &[StreamConfig]) -> Result<Self> {
        self.writer = self.writer.stream_configs(configs)?;
        Ok(self)
    }

    /// Seed the initial context
    #[must_use = "builder methods return a new value"]
    pub fn context_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.context.add_field(key, value);
        self
    }

    /// Set the notification sink, replacing any previous one
    #[must_use = "builder methods return a new value"]
    pub fn notification_sink(mut self, sink: NotificationSink) -> Self {
        self.notification_sink = Some(Arc::new(sink));
        self
    }

    /// Add another background destination
    #[must_use = "builder methods return a new value"]
    pub fn notifier<N: Notifier + 'static>(mut self, notifier: N) -> Self {
        self.notifiers.push(Arc::new(notifier));
        self
    }

    /// Set the callback receiving writer and background failures
    /// (default: one line on stderr)
    #[must_use = "builder methods return a new value"]
    pub fn on_diagnostic(mut self, callback: DiagnosticCallback) -> Self {
        self.on_diagnostic = Some(callback);
        self
    }

    pub fn build(self) -> Logger {
        let on_diagnostic = self.on_diagnostic.unwrap_or_else(stderr_diagnostics);

        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::with_capacity(self.notifiers.len() + 1);
        if let Some(sink) = &self.notification_sink {
            notifiers.push(Arc::clone(sink) as Arc<dyn Notifier>);
        }
        notifiers.extend(self.notifiers);

        Logger {
            inner: Arc::new(LoggerInner {
                context: RwLock::new(self.context),
                writer: self.writer.on_diagnostic(Arc::clone(&on_diagnostic)).build(),
                notification_sink: self.notification_sink,
                notifiers,
                on_diagnostic,
            }),
        }
    }
}
