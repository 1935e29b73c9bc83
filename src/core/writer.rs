//! Primary log writer
//!
//! A `LogWriter` owns a fixed set of streams (appender + minimum level) and
//! writes each record synchronously to every stream whose level it passes.
//! Writers derived with [`LogWriter::child`] share the streams and attach
//! extra fields to every record they write.

use super::{
    appender::Appender,
    error::{stderr_diagnostics, DiagnosticCallback, LoggerError, Result},
    log_context::LogContext,
    log_level::LogLevel,
    log_record::LogRecord,
    metrics::WriterMetrics,
};
use crate::appenders::{ConsoleAppender, FileAppender};
use crate::config::{StreamConfig, StreamTarget};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

struct Stream {
    level: LogLevel,
    appender: Box<dyn Appender>,
}

struct WriterShared {
    name: String,
    streams: Mutex<Vec<Stream>>,
    /// Lowest stream level; `None` when there are no streams.
    min_level: Option<LogLevel>,
    metrics: WriterMetrics,
    on_diagnostic: DiagnosticCallback,
}

#[derive(Clone)]
pub struct LogWriter {
    shared: Arc<WriterShared>,
    bound: LogContext,
}

impl LogWriter {
    /// Create a builder for LogWriter
    ///
    /// # Example
    /// ```
    /// use rust_scoped_logger::prelude::*;
    ///
    /// let memory = MemoryAppender::new();
    /// let writer = LogWriter::builder("api")
    ///     .stream(LogLevel::Debug, memory.clone())
    ///     .build();
    ///
    /// writer.write(LogLevel::Info, &LogContext::new(), "ready");
    /// assert_eq!(memory.len(), 1);
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> LogWriterBuilder {
        LogWriterBuilder::new(name)
    }

    /// Build a writer from stream descriptors.
    ///
    /// Every descriptor is validated before any file is opened.
    pub fn from_streams(name: impl Into<String>, streams: &[StreamConfig]) -> Result<Self> {
        Ok(Self::builder(name).stream_configs(streams)?.build())
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Fields attached to every record written through this writer
    pub fn bound_fields(&self) -> &LogContext {
        &self.bound
    }

    /// Whether any stream would accept a record at `level`
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.shared
            .min_level
            .is_some_and(|min| level.is_enabled_for(min))
    }

    /// Write one record. Record fields win over bound fields on collision.
    ///
    /// **Per-Appender Panic Isolation**: each appender call is wrapped in
    /// `catch_unwind`; a failing appender does not keep the record from the
    /// others. Failures are counted and reported to the diagnostic callback
    /// after the stream lock is released.
    pub fn write(&self, level: LogLevel, fields: &LogContext, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let record = LogRecord::new(
            self.shared.name.clone(),
            level,
            message,
            self.bound.merged(fields),
        );

        let mut failures = Vec::new();
        {
            let mut streams = self.shared.streams.lock();
            for (idx, stream) in streams.iter_mut().enumerate() {
                if !level.is_enabled_for(stream.level) {
                    continue;
                }

                let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    stream.appender.append(&record)
                }));

                match append_result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => failures.push(LoggerError::writer(format!(
                        "Appender #{} ({}) failed: {}",
                        idx,
                        stream.appender.name(),
                        e
                    ))),
                    Err(panic_info) => {
                        let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                            s.to_string()
                        } else if let Some(s) = panic_info.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "Unknown panic".to_string()
                        };
                        failures.push(LoggerError::writer(format!(
                            "Appender #{} ({}) panicked: {}. Other appenders continue to function.",
                            idx,
                            stream.appender.name(),
                            panic_msg
                        )));
                    }
                }
            }
        }

        if failures.is_empty() {
            self.shared.metrics.record_written();
        } else {
            self.shared.metrics.record_failed();
            for failure in &failures {
                (self.shared.on_diagnostic)(failure);
            }
        }
    }

    /// Derive a writer sharing this writer's streams, with `bound` attached
    /// as permanent fields (on top of any fields this writer already binds).
    #[must_use]
    pub fn child(&self, bound: &LogContext) -> LogWriter {
        LogWriter {
            shared: Arc::clone(&self.shared),
            bound: self.bound.merged(bound),
        }
    }

    pub fn flush(&self) -> Result<()> {
        let mut streams = self.shared.streams.lock();
        for stream in streams.iter_mut() {
            stream.appender.flush()?;
        }
        Ok(())
    }

    pub fn metrics(&self) -> &WriterMetrics {
        &self.shared.metrics
    }

    /// Whether two writers write to the same streams
    pub fn shares_streams_with(&self, other: &LogWriter) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogWriter")
            .field("name", &self.shared.name)
            .field("min_level", &self.shared.min_level)
            .field("bound", &self.bound)
            .finish()
    }
}

impl Drop for WriterShared {
    fn drop(&mut self) {
        for stream in self.streams.get_mut().iter_mut() {
            if let Err(e) = stream.appender.flush() {
                eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
            }
        }
    }
}

/// Builder for constructing LogWriter with a fluent API
pub struct LogWriterBuilder {
    name: String,
    streams: Vec<Stream>,
    on_diagnostic: Option<DiagnosticCallback>,
}

impl LogWriterBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            streams: Vec::new(),
            on_diagnostic: None,
        }
    }

    /// Add an appender receiving records at `level` and above
    #[must_use = "builder methods return a new value"]
    pub fn stream<A: Appender + 'static>(mut self, level: LogLevel, appender: A) -> Self {
        self.streams.push(Stream {
            level,
            appender: Box::new(appender),
        });
        self
    }

    /// Add one stream per descriptor.
    ///
    /// All descriptors are validated first, so a bad descriptor late in the
    /// list leaves no file half-opened.
    pub fn stream_configs(mut self, configs: &[StreamConfig]) -> Result<Self> {
        let targets = configs
            .iter()
            .map(|config| config.target().map(|target| (config.level, target)))
            .collect::<Result<Vec<_>>>()?;

        for (level, target) in targets {
            let appender: Box<dyn Appender> = match target {
                StreamTarget::Stdout => Box::new(ConsoleAppender::new()),
                StreamTarget::File(path) => Box::new(FileAppender::new(path)?),
            };
            self.streams.push(Stream { level, appender });
        }
        Ok(self)
    }

    /// Set the callback receiving appender failures (default: stderr)
    #[must_use = "builder methods return a new value"]
    pub fn on_diagnostic(mut self, callback: DiagnosticCallback) -> Self {
        self.on_diagnostic = Some(callback);
        self
    }

    pub fn build(self) -> LogWriter {
        let min_level = self.streams.iter().map(|s| s.level).min();
        LogWriter {
            shared: Arc::new(WriterShared {
                name: self.name,
                streams: Mutex::new(self.streams),
                min_level,
                metrics: WriterMetrics::new(),
                on_diagnostic: self.on_diagnostic.unwrap_or_else(stderr_diagnostics),
            }),
            bound: LogContext::new(),
        }
    }
}
