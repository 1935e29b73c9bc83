//! # Rust Scoped Logger
//!
//! Structured, context-carrying logging with chat alerts and per-invocation
//! logger scoping.
//!
//! ## Features
//!
//! - **Context accumulation**: set fields once, see them on every record
//! - **Child loggers**: independent copies with permanently bound fields
//! - **Chat notifications**: level-gated alerts delivered in the background
//! - **Execution scopes**: one logger per async call chain, no parameter threading
//! - **Environment configuration**: per-environment streams with built-in defaults
//!
//! ```
//! use rust_scoped_logger::prelude::*;
//!
//! let memory = MemoryAppender::new();
//! let logger = Logger::builder("billing").stream(LogLevel::Info, memory.clone()).build();
//!
//! logger.set_context("requestId", "r-42");
//! let child = logger.child(LogContext::new().with_field("component", "invoices"));
//! child.info("invoice created");
//!
//! let records = memory.records();
//! let record = &records[0];
//! assert_eq!(record.fields.get("requestId"), Some(&FieldValue::from("r-42")));
//! assert_eq!(record.fields.get("component"), Some(&FieldValue::from("invoices")));
//! ```

pub mod appenders;
pub mod config;
pub mod core;
pub mod macros;
pub mod notify;
pub mod scope;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, FileAppender, MemoryAppender};
    pub use crate::config::{EnvironmentConfig, LogConfig, NotificationConfig, StreamConfig};
    pub use crate::core::{
        is_level_enabled, Appender, DiagnosticCallback, FieldValue, LogContext, LogLevel,
        LogRecord, LogWriter, Logger, LoggerBuilder, LoggerError, NotificationRoute, Notifier,
        OutputFormat, Result,
    };
    pub use crate::notify::{NotificationClient, NotificationSink};
    pub use crate::scope::{current_logger, with_logger, ExecutionScope, InvocationContext, ScopeStore};
}

pub use appenders::{ConsoleAppender, FileAppender, MemoryAppender};
pub use config::{
    EnvironmentConfig, LogConfig, NotificationConfig, NotificationSettings, ResolvedConfig,
    StreamConfig,
};
pub use core::{
    is_level_enabled, stderr_diagnostics, Appender, DiagnosticCallback, FieldValue, LogContext,
    LogLevel, LogRecord, LogWriter, LogWriterBuilder, Logger, LoggerBuilder, LoggerError,
    NotificationMetrics, NotificationRoute, Notifier, OutputFormat, Result, WriterMetrics,
    ROUTE_KEY,
};
pub use notify::{ChatMessage, NotificationClient, NotificationSink};
#[cfg(feature = "slack")]
pub use notify::SlackWebClient;
pub use scope::{current_logger, with_logger, ExecutionScope, ScopeStore};
