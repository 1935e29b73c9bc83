//! Core logger types and traits

pub mod appender;
pub mod error;
pub mod log_context;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod notifier;
pub mod output_format;
pub mod writer;

pub use appender::Appender;
pub use error::{stderr_diagnostics, DiagnosticCallback, LoggerError, Result};
pub use log_context::{FieldValue, LogContext, NotificationRoute, ROUTE_KEY};
pub use log_level::{is_level_enabled, LogLevel};
pub use log_record::{LogRecord, RESERVED_KEYS};
pub use logger::{Logger, LoggerBuilder};
pub use metrics::{NotificationMetrics, WriterMetrics};
pub use notifier::Notifier;
pub use output_format::OutputFormat;
pub use writer::{LogWriter, LogWriterBuilder};
