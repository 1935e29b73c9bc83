//! Execution-scoped logger registry
//!
//! A logger can be bound to the current async call chain with
//! [`ExecutionScope::run`]; code anywhere inside that future (however deeply
//! nested) retrieves it with [`ExecutionScope::get_logger`] instead of having
//! it passed down. Bindings live in a tokio task-local, so concurrently
//! running scopes never see each other's logger, and a binding disappears as
//! soon as its future completes or is dropped.
//!
//! Outside any `run`, [`ExecutionScope::enter_with`] sets a binding for the
//! calling thread instead. It stays until [`ExecutionScope::exit`] and is
//! shadowed by any scope entered later on that thread.
//!
//! ```
//! use rust_scoped_logger::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scope = ExecutionScope::new();
//! let logger = Logger::builder("jobs").stream(LogLevel::Info, MemoryAppender::new()).build();
//!
//! scope
//!     .run(ScopeStore::with_logger(logger.clone()), async {
//!         let current = ExecutionScope::new().get_logger().unwrap();
//!         assert!(current.ptr_eq(&logger));
//!     })
//!     .await;
//!
//! assert!(scope.get_logger().is_err());
//! # }
//! ```

pub mod invocation;

use crate::config::LogConfig;
use crate::core::{Logger, LoggerError, Result};
use std::cell::RefCell;
use std::future::Future;

pub use invocation::{
    queue_message_ids, with_logger, BatchEvent, BatchRecord, EventRecord, InvocationContext,
    InvocationEvent, LoggerSource, WithLogger, FUNCTION_NAME_KEY, INVOCATION_ID_KEY,
    QUEUE_EVENT_SOURCE, QUEUE_MESSAGE_IDS_KEY,
};

tokio::task_local! {
    static CURRENT: RefCell<ScopeStore>;
}

thread_local! {
    static THREAD_BINDING: RefCell<Option<ScopeStore>> = const { RefCell::new(None) };
}

/// Value bound to one execution scope
#[derive(Debug, Clone, Default)]
pub struct ScopeStore {
    pub logger: Option<Logger>,
}

impl ScopeStore {
    pub fn with_logger(logger: Logger) -> Self {
        Self {
            logger: Some(logger),
        }
    }
}

/// Handle onto the process-wide scope registry.
///
/// There is a single registry per process. Every handle, including ones
/// created independently and passed to different wrappers, reads and writes
/// the same bindings; the type exists so code can take the registry as a
/// parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionScope;

impl ExecutionScope {
    pub const fn new() -> Self {
        ExecutionScope
    }

    /// Run `future` with `store` bound. A nested `run` shadows this binding
    /// for its own extent only.
    ///
    /// The returned future does not borrow `self`, so it can be handed to
    /// `tokio::spawn` directly.
    pub fn run<F: Future>(&self, store: ScopeStore, future: F) -> impl Future<Output = F::Output> {
        CURRENT.scope(RefCell::new(store), future)
    }

    /// Synchronous form of [`run`](Self::run)
    pub fn sync_run<R>(&self, store: ScopeStore, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(RefCell::new(store), f)
    }

    /// The innermost binding: the active scope's, else the calling
    /// thread's binding from [`enter_with`](Self::enter_with).
    pub fn current(&self) -> Option<ScopeStore> {
        CURRENT
            .try_with(|store| store.borrow().clone())
            .ok()
            .or_else(|| THREAD_BINDING.with(|binding| binding.borrow().clone()))
    }

    /// Whether a [`run`](Self::run) scope is active
    pub fn is_active(&self) -> bool {
        CURRENT.try_with(|_| ()).is_ok()
    }

    /// Set the current binding without a bracketing callback.
    ///
    /// Inside a scope this replaces that scope's binding until
    /// [`exit`](Self::exit) or until the scope ends. Outside any scope it
    /// binds the calling thread until `exit`.
    pub fn enter_with(&self, store: ScopeStore) {
        if CURRENT
            .try_with(|current| *current.borrow_mut() = store.clone())
            .is_err()
        {
            THREAD_BINDING.with(|binding| *binding.borrow_mut() = Some(store));
        }
    }

    /// Clear the binding set by [`enter_with`](Self::enter_with).
    ///
    /// Inside a scope the scope stays active with no logger bound.
    pub fn exit(&self) {
        if CURRENT
            .try_with(|current| *current.borrow_mut() = ScopeStore::default())
            .is_err()
        {
            THREAD_BINDING.with(|binding| *binding.borrow_mut() = None);
        }
    }

    /// The logger bound to the current scope.
    ///
    /// Fails with [`LoggerError::LoggerNotBound`] when nothing is bound or
    /// the binding has no logger.
    pub fn get_logger(&self) -> Result<Logger> {
        self.current()
            .and_then(|store| store.logger)
            .ok_or(LoggerError::LoggerNotBound)
    }

    /// The bound logger, or a new one built from `config` for the current
    /// environment. A new logger is bound with [`enter_with`](Self::enter_with)
    /// so later lookups return the same instance.
    pub fn get_or_create_logger(&self, config: &LogConfig) -> Result<Logger> {
        if let Ok(logger) = self.get_logger() {
            return Ok(logger);
        }

        let logger = Logger::from_config(config)?;
        self.enter_with(ScopeStore::with_logger(logger.clone()));
        Ok(logger)
    }

    /// Spawn a tokio task that inherits the current binding.
    ///
    /// `tokio::spawn` alone starts the task with no binding.
    pub fn spawn<F>(&self, future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match self.current() {
            Some(store) => tokio::spawn(CURRENT.scope(RefCell::new(store), future)),
            None => tokio::spawn(future),
        }
    }
}

/// Shorthand for `ExecutionScope::new().get_logger()`
pub fn current_logger() -> Result<Logger> {
    ExecutionScope::new().get_logger()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryAppender;
    use crate::core::LogLevel;

    fn logger(name: &str) -> Logger {
        Logger::builder(name).stream(LogLevel::Info, MemoryAppender::new()).build()
    }

    #[test]
    fn test_get_logger_outside_scope_fails() {
        let err = ExecutionScope::new().get_logger().unwrap_err();
        assert!(matches!(err, LoggerError::LoggerNotBound));
        assert!(!ExecutionScope::new().is_active());
    }

    #[test]
    fn test_sync_run_binds_and_reverts() {
        let scope = ExecutionScope::new();
        let bound = logger("sync");

        let inside = scope.sync_run(ScopeStore::with_logger(bound.clone()), || scope.get_logger());
        assert!(inside.unwrap().ptr_eq(&bound));
        assert!(scope.current().is_none());
    }

    #[test]
    fn test_enter_with_outside_scope_binds_thread() {
        let scope = ExecutionScope::new();
        let bound = logger("thread");

        scope.enter_with(ScopeStore::with_logger(bound.clone()));
        assert!(!scope.is_active());
        assert!(scope.get_logger().unwrap().ptr_eq(&bound));
        assert!(current_logger().unwrap().ptr_eq(&bound));

        let other_thread = std::thread::spawn(|| current_logger().is_err()).join().unwrap();
        assert!(other_thread);

        scope.exit();
        assert!(matches!(scope.get_logger(), Err(LoggerError::LoggerNotBound)));
    }

    #[test]
    fn test_scope_shadows_thread_binding() {
        let scope = ExecutionScope::new();
        let thread_bound = logger("thread");
        let scoped = logger("scoped");

        scope.enter_with(ScopeStore::with_logger(thread_bound.clone()));
        let inside = scope.sync_run(ScopeStore::with_logger(scoped.clone()), || scope.get_logger());
        assert!(inside.unwrap().ptr_eq(&scoped));
        assert!(scope.get_logger().unwrap().ptr_eq(&thread_bound));
        scope.exit();
    }

    #[test]
    fn test_get_or_create_outside_scope_reuses_instance() {
        let scope = ExecutionScope::new();
        let config = LogConfig::new("created").with_environment(
            "local",
            crate::config::EnvironmentConfig::new(Vec::new()),
        );

        let first = scope.get_or_create_logger(&config).unwrap();
        first.set_context("requestId", "r-1");
        let second = scope.get_or_create_logger(&config).unwrap();

        assert!(second.ptr_eq(&first));
        assert!(second.context().contains_key("requestId"));
        scope.exit();
    }

    #[test]
    fn test_handles_share_one_registry() {
        let bound = logger("shared");
        ExecutionScope::new().enter_with(ScopeStore::with_logger(bound.clone()));

        assert!(ExecutionScope::new().get_logger().unwrap().ptr_eq(&bound));
        ExecutionScope::default().exit();
        assert!(ExecutionScope::new().get_logger().is_err());
    }

    #[tokio::test]
    async fn test_nested_run_shadows_then_reverts() {
        let scope = ExecutionScope::new();
        let outer = logger("outer");
        let inner = logger("inner");

        scope
            .run(ScopeStore::with_logger(outer.clone()), async {
                scope
                    .run(ScopeStore::with_logger(inner.clone()), async {
                        assert!(scope.get_logger().unwrap().ptr_eq(&inner));
                    })
                    .await;
                assert!(scope.get_logger().unwrap().ptr_eq(&outer));
            })
            .await;
    }

    #[tokio::test]
    async fn test_enter_with_and_exit_inside_scope() {
        let scope = ExecutionScope::new();
        let replacement = logger("replacement");

        scope
            .run(ScopeStore::default(), async {
                assert!(scope.get_logger().is_err());
                scope.enter_with(ScopeStore::with_logger(replacement.clone()));
                assert!(scope.get_logger().unwrap().ptr_eq(&replacement));
                scope.exit();
                assert!(matches!(scope.get_logger(), Err(LoggerError::LoggerNotBound)));
                assert!(scope.is_active());
            })
            .await;
    }

    #[tokio::test]
    async fn test_spawn_inherits_binding() {
        let scope = ExecutionScope::new();
        let bound = logger("parent");

        let seen = scope
            .run(ScopeStore::with_logger(bound.clone()), async {
                let inherited = scope.spawn(async { current_logger() });
                let detached = tokio::spawn(async { current_logger() });
                (inherited.await.unwrap(), detached.await.unwrap())
            })
            .await;

        assert!(seen.0.unwrap().ptr_eq(&bound));
        assert!(seen.1.is_err());
    }

    #[tokio::test]
    async fn test_get_or_create_binds_into_active_scope() {
        let scope = ExecutionScope::new();
        let config = LogConfig::new("created").with_environment(
            "local",
            crate::config::EnvironmentConfig::new(Vec::new()),
        );

        scope
            .run(ScopeStore::default(), async {
                let created = scope.get_or_create_logger(&config).unwrap();
                assert!(scope.get_logger().unwrap().ptr_eq(&created));
                assert!(scope.get_or_create_logger(&config).unwrap().ptr_eq(&created));
            })
            .await;
    }
}
