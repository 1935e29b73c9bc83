//! Integration tests for the logger core
//!
//! These tests verify:
//! - Context accumulation and per-call merging
//! - Routing key stripping before the primary write
//! - Child derivation and context independence
//! - Background notification fan-out and failure reporting
//! - Configuration-driven construction

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_scoped_logger::notify::{ChatMessage, NotificationClient, NotificationSink};
use rust_scoped_logger::prelude::*;
use rust_scoped_logger::{NotificationConfig, ROUTE_KEY};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{mpsc, Notify};

fn memory_logger(name: &str) -> (Logger, MemoryAppender) {
    let memory = MemoryAppender::new();
    let logger = Logger::builder(name).stream(LogLevel::Trace, memory.clone()).build();
    (logger, memory)
}

fn ctx<const N: usize>(pairs: [(&str, &str); N]) -> LogContext {
    pairs.into_iter().collect()
}

/// Notification client that records messages and reports each one on a channel
struct ChannelClient {
    tx: mpsc::UnboundedSender<ChatMessage>,
    fail: bool,
}

#[async_trait]
impl NotificationClient for ChannelClient {
    async fn post_message(&self, message: &ChatMessage) -> Result<()> {
        let _ = self.tx.send(message.clone());
        if self.fail {
            Err(LoggerError::other("invalid_auth"))
        } else {
            Ok(())
        }
    }
}

/// Notifier that never completes
struct HangingNotifier;

#[async_trait]
impl Notifier for HangingNotifier {
    async fn notify(&self, _level: LogLevel, _message: &str, _context: &LogContext) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }

    fn name(&self) -> &str {
        "hanging"
    }
}

/// Notifier that always fails
struct RejectingNotifier;

#[async_trait]
impl Notifier for RejectingNotifier {
    async fn notify(&self, _level: LogLevel, _message: &str, _context: &LogContext) -> Result<()> {
        Err(LoggerError::other("upstream rejected"))
    }

    fn name(&self) -> &str {
        "rejecting"
    }
}

fn capture_diagnostics() -> (DiagnosticCallback, Arc<Mutex<Vec<String>>>, Arc<Notify>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let notify = Arc::new(Notify::new());
    let (seen_clone, notify_clone) = (Arc::clone(&seen), Arc::clone(&notify));
    let callback: DiagnosticCallback = Arc::new(move |err: &LoggerError| {
        seen_clone.lock().push(err.to_string());
        notify_clone.notify_one();
    });
    (callback, seen, notify)
}

#[test]
fn test_stored_context_is_the_record() {
    let (logger, memory) = memory_logger("ctx");
    logger.set_context("userId", "123");
    logger.info("msg");

    let records = memory.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].msg, "msg");
    assert_eq!(records[0].fields, ctx([("userId", "123")]));
}

#[test]
fn test_extra_fields_merge_and_win() {
    let (logger, memory) = memory_logger("merge");
    logger.set_context("userId", "123");
    logger.info_with_context("msg", ctx([("requestId", "456")]));
    logger.info_with_context("override", ctx([("userId", "override")]));

    let records = memory.records();
    assert_eq!(records[0].fields, ctx([("userId", "123"), ("requestId", "456")]));
    assert_eq!(records[1].fields, ctx([("userId", "override")]));
    // Per-call fields are not stored
    assert_eq!(logger.context(), ctx([("userId", "123")]));
}

#[test]
fn test_child_bound_fields_override_only_colliding_keys() {
    let (parent, memory) = memory_logger("parent");
    parent.set_context("userId", "456").set_context("requestId", "789");

    let child = parent.child(ctx([("userId", "123")]));
    child.info("from child");

    assert_eq!(
        memory.records()[0].fields,
        ctx([("userId", "123"), ("requestId", "789")])
    );
}

#[test]
fn test_parent_and_child_contexts_are_independent() {
    let (parent, _memory) = memory_logger("parent");
    parent.set_context("inherited", "yes");
    let child = parent.child(LogContext::new());

    parent.set_context("a", 1);
    child.set_context("b", 2);

    assert_eq!(
        parent.context(),
        LogContext::new().with_field("inherited", "yes").with_field("a", 1)
    );
    assert_eq!(
        child.context(),
        LogContext::new().with_field("inherited", "yes").with_field("b", 2)
    );
}

#[test]
fn test_child_shares_writer_and_sink() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let sink = NotificationSink::new(
        NotificationConfig::new("token", LogLevel::Error),
        Arc::new(ChannelClient { tx, fail: false }),
    );
    let memory = MemoryAppender::new();
    let parent = Logger::builder("svc")
        .stream(LogLevel::Info, memory.clone())
        .notification_sink(sink)
        .build();

    let child = parent.child(ctx([("component", "auth")]));
    let grandchild = child.child(ctx([("step", "verify")]));

    assert!(Arc::ptr_eq(
        parent.notification_sink().unwrap(),
        grandchild.notification_sink().unwrap()
    ));
    assert!(grandchild.writer().shares_streams_with(parent.writer()));

    grandchild.info("checked");
    assert_eq!(
        memory.records()[0].fields,
        ctx([("component", "auth"), ("step", "verify")])
    );
}

#[test]
fn test_primary_writes_keep_call_order() {
    let (logger, memory) = memory_logger("order");
    for i in 0..100 {
        logger.debug(format!("message {}", i));
    }

    let messages: Vec<String> = memory.records().into_iter().map(|r| r.msg).collect();
    let expected: Vec<String> = (0..100).map(|i| format!("message {}", i)).collect();
    assert_eq!(messages, expected);
}

#[tokio::test]
async fn test_routing_key_reaches_notification_but_not_writer() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = NotificationSink::new(
        NotificationConfig::new("token", LogLevel::Warn).with_default_channel("#default"),
        Arc::new(ChannelClient { tx, fail: false }),
    );
    let memory = MemoryAppender::new();
    let logger = Logger::builder("routes")
        .stream(LogLevel::Info, memory.clone())
        .notification_sink(sink)
        .build();

    logger.set_context("orderId", "o-1");
    logger.error_with_context(
        "payment failed",
        LogContext::new().with_route(NotificationRoute::new("#payments").with_username("Billing")),
    );

    let records = memory.records();
    let record = &records[0];
    assert!(!record.fields.contains_key(ROUTE_KEY));
    assert_eq!(record.fields, ctx([("orderId", "o-1")]));

    let chat = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chat.channel, "#payments");
    assert_eq!(chat.username, "Billing");
    assert_eq!(chat.text, "ERROR: payment failed");
    let fields = &chat.attachments.unwrap()[0].fields;
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].title, "orderId");
}

#[tokio::test]
async fn test_below_threshold_is_not_sent() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = NotificationSink::new(
        NotificationConfig::new("token", LogLevel::Info),
        Arc::new(ChannelClient { tx, fail: false }),
    );
    let logger = Logger::builder("quiet").notification_sink(sink).build();

    logger.debug_with_context(
        "noise",
        LogContext::new().with_route(NotificationRoute::new("#c")),
    );
    logger.info_with_context(
        "signal",
        LogContext::new().with_route(NotificationRoute::new("#c")),
    );

    let chat = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chat.text, "INFO: signal");
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_rejected_background_delivery_yields_one_diagnostic() {
    let (callback, seen, notified) = capture_diagnostics();
    let memory = MemoryAppender::new();
    let logger = Logger::builder("bg")
        .stream(LogLevel::Info, memory.clone())
        .notifier(RejectingNotifier)
        .on_diagnostic(callback)
        .build();

    logger.warn("disk almost full");

    // The primary write is complete when the call returns
    assert_eq!(memory.len(), 1);

    tokio::time::timeout(Duration::from_secs(5), notified.notified())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("Error in background logging operations (rejecting)"));
    assert!(seen[0].contains("upstream rejected"));
}

#[tokio::test]
async fn test_sink_delivery_failure_yields_one_diagnostic() {
    let (callback, seen, notified) = capture_diagnostics();
    let (tx, _rx) = mpsc::unbounded_channel();
    let sink = NotificationSink::new(
        NotificationConfig::new("token", LogLevel::Info).with_default_channel("#ops"),
        Arc::new(ChannelClient { tx, fail: true }),
    )
    .with_diagnostics(Arc::clone(&callback));
    let logger = Logger::builder("sink")
        .notification_sink(sink)
        .on_diagnostic(callback)
        .build();

    logger.error("db down");

    tokio::time::timeout(Duration::from_secs(5), notified.notified())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(seen.lock().len(), 1);
    assert_eq!(logger.notification_sink().unwrap().metrics().failed(), 1);
}

#[tokio::test]
async fn test_hanging_notifier_does_not_delay_caller_or_others() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = NotificationSink::new(
        NotificationConfig::new("token", LogLevel::Info).with_default_channel("#ops"),
        Arc::new(ChannelClient { tx, fail: false }),
    );
    let memory = MemoryAppender::new();
    let logger = Logger::builder("hang")
        .stream(LogLevel::Info, memory.clone())
        .notifier(HangingNotifier)
        .notification_sink(sink)
        .build();

    for i in 0..3 {
        logger.info(format!("call {}", i));
    }
    assert_eq!(memory.len(), 3);

    for _ in 0..3 {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
    }
}

#[test]
fn test_notifications_without_runtime() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = NotificationSink::new(
        NotificationConfig::new("token", LogLevel::Info).with_default_channel("#ops"),
        Arc::new(ChannelClient { tx, fail: false }),
    );
    let logger = Logger::builder("sync").notification_sink(sink).build();

    logger.fatal("no runtime here");

    let chat = tokio_test::block_on(async {
        tokio::time::timeout(Duration::from_secs(5), rx.recv()).await
    });
    assert_eq!(chat.unwrap().unwrap().text, "FATAL: no runtime here");
}

#[test]
fn test_file_stream_without_path_fails_construction() {
    let config = LogConfig::from_json_str(
        r#"{
            "name": "broken",
            "environments": { "local": { "streams": [{ "level": "info", "type": "file" }] } }
        }"#,
    )
    .unwrap();

    let err = Logger::from_config_for(&config, "local").unwrap_err();
    assert!(matches!(err, LoggerError::MissingFilePath));
    assert!(err.is_configuration());
    assert!(err.to_string().contains("File path is required"));
}

#[test]
fn test_unknown_stream_type_and_environment_fail_construction() {
    let config = LogConfig::new("svc").with_environment(
        "local",
        EnvironmentConfig::new(vec![StreamConfig {
            level: LogLevel::Info,
            kind: "syslog".to_string(),
            path: None,
        }]),
    );
    let err = Logger::from_config_for(&config, "local").unwrap_err();
    assert_eq!(err.to_string(), "Unknown stream type: syslog");

    let err = Logger::from_config_for(&config, "qa").unwrap_err();
    assert!(matches!(err, LoggerError::UnknownEnvironment { ref environment } if environment == "qa"));
}

#[test]
fn test_file_streams_from_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let info_log = temp_dir.path().join("logs").join("info.log");
    let error_log = temp_dir.path().join("logs").join("error.log");

    let config = LogConfig::new("files").with_environment(
        "local",
        EnvironmentConfig::new(vec![
            StreamConfig::file(LogLevel::Info, &info_log),
            StreamConfig::file(LogLevel::Error, &error_log),
        ]),
    );
    let logger = Logger::from_config_for(&config, "local").expect("Failed to build logger");
    assert!(logger.notification_sink().is_none());

    logger.set_context("userId", "123");
    logger.debug("dropped");
    logger.info("User login\nERROR fake entry");
    logger.error("failed");
    logger.flush().expect("Failed to flush");

    let info_content = fs::read_to_string(&info_log).expect("Failed to read info log");
    let lines: Vec<&str> = info_content.lines().collect();
    assert_eq!(lines.len(), 2, "Injected newline must not split the record");

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["name"], "files");
    assert_eq!(first["msg"], "User login\\nERROR fake entry");
    assert_eq!(first["userId"], "123");

    let error_content = fs::read_to_string(&error_log).expect("Failed to read error log");
    assert_eq!(error_content.lines().count(), 1);
}

#[cfg(feature = "slack")]
#[test]
fn test_notification_sink_built_only_with_token() {
    let config = LogConfig::new("alerts")
        .with_environment("staging", EnvironmentConfig::new(vec![StreamConfig::stdout(LogLevel::Fatal)]));

    let without_token = Logger::from_config_for(&config, "staging").unwrap();
    assert!(without_token.notification_sink().is_none());

    let with_token = Logger::from_config_for(&config.clone().with_notification_token("xoxb-1"), "staging").unwrap();
    let sink = with_token.notification_sink().expect("sink should be configured");
    assert_eq!(sink.config().level, LogLevel::Warn);
    assert_eq!(sink.config().default_channel.as_deref(), Some("#staging-logs"));
    assert_eq!(sink.config().api_token, "xoxb-1");
}
