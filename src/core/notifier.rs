//! Background notification trait and dispatch

use super::{
    error::{DiagnosticCallback, LoggerError, Result},
    log_context::LogContext,
    log_level::LogLevel,
};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::thread;
use tokio::sync::mpsc;

/// Secondary destination that receives log calls in the background.
///
/// A logger launches every notifier independently after the primary write;
/// an `Err` is reported once to the logger's diagnostic callback and is never
/// seen by the logging caller.
///
/// # Example
///
/// ```no_run
/// use rust_scoped_logger::core::{LogContext, LogLevel, Notifier, Result};
/// use async_trait::async_trait;
///
/// struct PagerNotifier;
///
/// #[async_trait]
/// impl Notifier for PagerNotifier {
///     async fn notify(&self, level: LogLevel, message: &str, context: &LogContext) -> Result<()> {
///         // Page someone
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "pager"
///     }
/// }
/// ```
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one log call. `context` is the full context, routing key included.
    async fn notify(&self, level: LogLevel, message: &str, context: &LogContext) -> Result<()>;

    /// Get the notifier name
    fn name(&self) -> &str;

    /// Cheap pre-check; calls at a level this returns `false` for are not
    /// dispatched at all.
    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }
}

/// Launch one delivery per notifier without waiting for any of them.
pub(crate) fn dispatch(
    notifiers: &[Arc<dyn Notifier>],
    level: LogLevel,
    message: &str,
    context: &LogContext,
    on_diagnostic: &DiagnosticCallback,
) {
    for notifier in notifiers.iter().filter(|n| n.enabled(level)) {
        let notifier = Arc::clone(notifier);
        let diagnostics = Arc::clone(on_diagnostic);
        let message = message.to_string();
        let context = context.clone();

        spawn_detached(
            async move {
                if let Err(e) = notifier.notify(level, &message, &context).await {
                    diagnostics(&LoggerError::background(notifier.name(), e.to_string()));
                }
            },
            on_diagnostic,
        );
    }
}

type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Queue into the shared background worker, started on first use
static BACKGROUND: OnceLock<Option<mpsc::UnboundedSender<Task>>> = OnceLock::new();

/// Run `task` on the ambient tokio runtime, or on the shared background
/// worker when called outside any runtime.
fn spawn_detached<F>(task: F, on_diagnostic: &DiagnosticCallback)
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(task);
        return;
    }

    let sender = BACKGROUND.get_or_init(|| match start_background_worker() {
        Ok(sender) => Some(sender),
        Err(e) => {
            on_diagnostic(&LoggerError::io_operation(
                "starting notification worker",
                "notifications outside a runtime are disabled",
                e,
            ));
            None
        }
    });

    let delivered = sender
        .as_ref()
        .map(|sender| sender.send(Box::pin(task)).is_ok())
        .unwrap_or(false);
    if !delivered {
        on_diagnostic(&LoggerError::background(
            BACKGROUND_THREAD_NAME,
            "background worker unavailable, notification dropped",
        ));
    }
}

const BACKGROUND_THREAD_NAME: &str = "logger-notify";

/// One long-lived thread driving a current-thread runtime. Every received
/// task is spawned onto it, so deliveries still run independently.
fn start_background_worker() -> std::io::Result<mpsc::UnboundedSender<Task>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();

    thread::Builder::new()
        .name(BACKGROUND_THREAD_NAME.to_string())
        .spawn(move || {
            runtime.block_on(async move {
                while let Some(task) = receiver.recv().await {
                    tokio::spawn(task);
                }
            });
        })?;

    Ok(sender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::mpsc;
    use std::time::Duration;

    struct ChannelNotifier {
        tx: Mutex<mpsc::Sender<String>>,
    }

    #[async_trait]
    impl Notifier for ChannelNotifier {
        async fn notify(&self, _level: LogLevel, message: &str, _context: &LogContext) -> Result<()> {
            let _ = self.tx.lock().send(message.to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "channel"
        }
    }

    #[test]
    fn test_dispatch_without_runtime_uses_worker_thread() {
        let (tx, rx) = mpsc::channel();
        let notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(ChannelNotifier { tx: Mutex::new(tx) })];

        dispatch(
            &notifiers,
            LogLevel::Warn,
            "disk almost full",
            &LogContext::new(),
            &crate::core::stderr_diagnostics(),
        );

        let received = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received, "disk almost full");
    }

    /// Records which thread ran each delivery, after a delay
    struct SlowNotifier {
        tx: Mutex<mpsc::Sender<Option<String>>>,
    }

    #[async_trait]
    impl Notifier for SlowNotifier {
        async fn notify(&self, _level: LogLevel, _message: &str, _context: &LogContext) -> Result<()> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = self
                .tx
                .lock()
                .send(std::thread::current().name().map(str::to_string));
            Ok(())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[test]
    fn test_burst_without_runtime_shares_one_worker() {
        let (tx, rx) = mpsc::channel();
        let notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(SlowNotifier { tx: Mutex::new(tx) })];
        let diagnostics = crate::core::stderr_diagnostics();

        let started = std::time::Instant::now();
        for _ in 0..200 {
            dispatch(&notifiers, LogLevel::Error, "burst", &LogContext::new(), &diagnostics);
        }

        let threads: Vec<Option<String>> = (0..200)
            .map(|_| rx.recv_timeout(Duration::from_secs(10)).unwrap())
            .collect();

        assert!(threads
            .iter()
            .all(|name| name.as_deref() == Some(BACKGROUND_THREAD_NAME)));
        // 200 sequential deliveries would take 20s
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
