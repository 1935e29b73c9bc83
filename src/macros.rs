//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. Extra fields for a
//! single call go in a leading `context = ...` argument.
//!
//! # Examples
//!
//! ```
//! use rust_scoped_logger::prelude::*;
//! use rust_scoped_logger::{info, warn};
//!
//! let memory = MemoryAppender::new();
//! let logger = Logger::builder("web").stream(LogLevel::Info, memory.clone()).build();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With per-call fields
//! warn!(logger, context = LogContext::new().with_field("port", 8080), "Port {} is slow", port);
//!
//! assert_eq!(memory.len(), 3);
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_scoped_logger::prelude::*;
/// # let logger = Logger::builder("svc").build();
/// use rust_scoped_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// log!(logger, LogLevel::Error, context = LogContext::new().with_field("code", 500), "Request failed");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, context = $ctx:expr, $($arg:tt)+) => {
        $logger.log_with_context($level, format!($($arg)+), $ctx)
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_scoped_logger::prelude::*;
/// # let logger = Logger::builder("svc").build();
/// use rust_scoped_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_scoped_logger::prelude::*;
/// # let logger = Logger::builder("svc").build();
/// use rust_scoped_logger::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
