//! Per-invocation handler wrapper
//!
//! [`with_logger`] wraps a handler `(event, context) -> Result` so that each
//! call resolves a logger, stamps it with the invocation metadata, and runs the
//! handler inside an execution scope bound to that logger.

use super::{ExecutionScope, ScopeStore};
use crate::config::LogConfig;
use crate::core::{Logger, LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;

pub const INVOCATION_ID_KEY: &str = "invocationId";
pub const FUNCTION_NAME_KEY: &str = "functionName";
pub const QUEUE_MESSAGE_IDS_KEY: &str = "queueMessageIds";

/// `eventSource` tag of records delivered from a message queue
pub const QUEUE_EVENT_SOURCE: &str = "aws:sqs";

/// Metadata the hosting runtime passes alongside each event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    pub invocation_id: String,
    pub function_name: String,
}

impl InvocationContext {
    pub fn new(invocation_id: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            function_name: function_name.into(),
        }
    }
}

/// One sub-record of a batch event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub event_source: String,
    pub message_id: Option<String>,
}

/// Events that may carry a batch of source-tagged records.
pub trait InvocationEvent {
    fn records(&self) -> Vec<EventRecord> {
        Vec::new()
    }
}

impl InvocationEvent for () {}

/// Reads `Records[].eventSource` and `Records[].messageId`.
impl InvocationEvent for serde_json::Value {
    fn records(&self) -> Vec<EventRecord> {
        let Some(records) = self.get("Records").and_then(serde_json::Value::as_array) else {
            return Vec::new();
        };

        records
            .iter()
            .filter_map(|record| {
                let event_source = record.get("eventSource")?.as_str()?.to_string();
                let message_id = record
                    .get("messageId")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string);
                Some(EventRecord {
                    event_source,
                    message_id,
                })
            })
            .collect()
    }
}

/// Typed batch event, wire-compatible with queue-triggered payloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<BatchRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub event_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl InvocationEvent for BatchEvent {
    fn records(&self) -> Vec<EventRecord> {
        self.records
            .iter()
            .map(|record| EventRecord {
                event_source: record.event_source.clone(),
                message_id: record.message_id.clone(),
            })
            .collect()
    }
}

/// Message ids of queue-sourced records, in event order.
///
/// Queue records without an id are skipped.
pub fn queue_message_ids<E: InvocationEvent + ?Sized>(event: &E) -> Vec<String> {
    event
        .records()
        .into_iter()
        .filter(|record| record.event_source == QUEUE_EVENT_SOURCE)
        .filter_map(|record| record.message_id)
        .collect()
}

/// Where the wrapper gets its logger on each invocation
#[derive(Debug, Clone)]
pub enum LoggerSource {
    /// Always the same logger
    Instance(Logger),
    /// Whatever is bound to the enclosing execution scope
    Scoped,
    /// A new logger per invocation, built for the current environment
    Config(LogConfig),
}

impl LoggerSource {
    pub fn resolve(&self, scope: &ExecutionScope) -> Result<Logger> {
        match self {
            LoggerSource::Instance(logger) => Ok(logger.clone()),
            LoggerSource::Scoped => scope.get_logger(),
            LoggerSource::Config(config) => Logger::from_config(config),
        }
    }
}

impl From<Logger> for LoggerSource {
    fn from(logger: Logger) -> Self {
        LoggerSource::Instance(logger)
    }
}

impl From<LogConfig> for LoggerSource {
    fn from(config: LogConfig) -> Self {
        LoggerSource::Config(config)
    }
}

/// Handler wrapped by [`with_logger`]
#[derive(Debug, Clone)]
pub struct WithLogger<H> {
    scope: ExecutionScope,
    source: LoggerSource,
    handler: H,
}

/// Wrap `handler` so every call runs with a logger bound in `scope`.
///
/// # Example
///
/// ```
/// use rust_scoped_logger::prelude::*;
/// use rust_scoped_logger::scope::{with_logger, InvocationContext};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let memory = MemoryAppender::new();
/// let logger = Logger::builder("orders").stream(LogLevel::Info, memory.clone()).build();
///
/// let handler = with_logger(ExecutionScope::new(), logger, |event: serde_json::Value, _ctx: InvocationContext| async move {
///     current_logger()?.info("processing");
///     Ok::<_, LoggerError>(event["Records"].as_array().map_or(0, Vec::len))
/// });
///
/// let event = serde_json::json!({
///     "Records": [{ "eventSource": "aws:sqs", "messageId": "m-1" }]
/// });
/// let processed = handler.call(event, InvocationContext::new("req-1", "orders-fn")).await?;
///
/// assert_eq!(processed, 1);
/// assert_eq!(
///     memory.records()[0].fields.get("queueMessageIds"),
///     Some(&FieldValue::from(vec!["m-1"]))
/// );
/// # Ok(())
/// # }
/// ```
pub fn with_logger<H>(scope: ExecutionScope, source: impl Into<LoggerSource>, handler: H) -> WithLogger<H> {
    WithLogger {
        scope,
        source: source.into(),
        handler,
    }
}

impl<H> WithLogger<H> {
    /// Handle one invocation.
    ///
    /// The logger gets `invocationId` and `functionName`, plus
    /// `queueMessageIds` when the event holds queue records (otherwise the
    /// key is removed, so a reused logger never reports a previous batch).
    /// The handler's result is returned unchanged; the binding ends with the
    /// call whether the handler succeeds, fails, or panics.
    pub async fn call<E, Fut, T, Err>(&self, event: E, context: InvocationContext) -> std::result::Result<T, Err>
    where
        E: InvocationEvent,
        H: Fn(E, InvocationContext) -> Fut,
        Fut: Future<Output = std::result::Result<T, Err>>,
        Err: From<LoggerError>,
    {
        let logger = self.source.resolve(&self.scope)?;

        logger
            .set_context(INVOCATION_ID_KEY, context.invocation_id.as_str())
            .set_context(FUNCTION_NAME_KEY, context.function_name.as_str());

        let ids = queue_message_ids(&event);
        if ids.is_empty() {
            logger.remove_context(QUEUE_MESSAGE_IDS_KEY);
        } else {
            logger.set_context(QUEUE_MESSAGE_IDS_KEY, ids);
        }

        let handler = &self.handler;
        self.scope
            .run(ScopeStore::with_logger(logger), async move { handler(event, context).await })
            .await
    }

    pub fn source(&self) -> &LoggerSource {
        &self.source
    }
}
