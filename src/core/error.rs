//! Error types for the logger system

use std::sync::Arc;

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Callback receiving failures the logger recovers from on its own
/// (appender failures, notification delivery failures).
pub type DiagnosticCallback = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Default diagnostic channel: one line on stderr per failure.
pub fn stderr_diagnostics() -> DiagnosticCallback {
    Arc::new(|err: &LoggerError| eprintln!("[LOGGER ERROR] {}", err))
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Stream descriptor with a type outside the known set
    #[error("Unknown stream type: {kind}")]
    UnknownStreamType { kind: String },

    /// File stream descriptor without a path
    #[error("File path is required for file streams")]
    MissingFilePath,

    /// Neither user nor default configuration exists for the environment
    #[error("Invalid or missing configuration for environment: {environment}")]
    UnknownEnvironment { environment: String },

    /// No logger bound in the current execution scope
    #[error("Logger not found in context. Make sure you are running within a context scope.")]
    LoggerNotBound,

    /// Chat notification could not be delivered
    #[error("Error sending notification to '{channel}': {message}")]
    NotificationDelivery { channel: String, message: String },

    /// A background notifier failed
    #[error("Error in background logging operations ({notifier}): {message}")]
    BackgroundDelivery { notifier: String, message: String },

    /// HTTP transport error from the notification client
    #[cfg(feature = "slack")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn unknown_stream_type(kind: impl Into<String>) -> Self {
        LoggerError::UnknownStreamType { kind: kind.into() }
    }

    pub fn unknown_environment(environment: impl Into<String>) -> Self {
        LoggerError::UnknownEnvironment {
            environment: environment.into(),
        }
    }

    pub fn delivery(channel: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::NotificationDelivery {
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub fn background(notifier: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::BackgroundDelivery {
            notifier: notifier.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Configuration errors are raised at construction time only.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidConfiguration { .. }
                | LoggerError::UnknownStreamType { .. }
                | LoggerError::MissingFilePath
                | LoggerError::UnknownEnvironment { .. }
        )
    }
}
