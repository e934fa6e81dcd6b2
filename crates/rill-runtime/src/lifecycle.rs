//! Startup/shutdown lifecycle management.
//!
//! Applications register [`StartupHook`]s — scoped resources with an
//! acquire and a release step. The [`LifecycleManager`] acquires them
//! in registration order before the consumption loop starts and
//! releases them in exact reverse order when the run ends, whatever the
//! exit path: normal completion, a loop error, an external shutdown
//! signal, or a failure while acquiring a later hook.
//!
//! Release failures are logged and never propagated, so later releases
//! still run.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by lifecycle hooks.
#[derive(Debug, Clone, Error)]
pub enum LifecycleError {
    /// A hook's acquire step failed. Aborts the run before consumption
    /// begins; already-acquired hooks are still released.
    #[error("startup hook '{hook}' failed to acquire: {reason}")]
    Acquire {
        /// Name of the failing hook.
        hook: String,
        /// Description of the failure.
        reason: String,
    },

    /// A hook's release step failed. Logged by the manager, never
    /// propagated.
    #[error("startup hook '{hook}' failed to release: {reason}")]
    Release {
        /// Name of the failing hook.
        hook: String,
        /// Description of the failure.
        reason: String,
    },
}

impl LifecycleError {
    /// Creates an acquire error.
    pub fn acquire(hook: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Acquire {
            hook: hook.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a release error.
    pub fn release(hook: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Release {
            hook: hook.into(),
            reason: reason.to_string(),
        }
    }
}

/// A scoped resource bracketing the consumption loop's lifetime.
#[async_trait]
pub trait StartupHook: Send + Sync + 'static {
    /// Name used in logs and error messages.
    fn name(&self) -> &str {
        "startup-hook"
    }

    /// Acquires the resource. Runs before the consumption loop starts.
    async fn acquire(&self) -> Result<(), LifecycleError>;

    /// Releases the resource. Runs during teardown in reverse
    /// registration order; a returned error is logged, not propagated.
    async fn release(&self) -> Result<(), LifecycleError>;
}

/// A hook built from an async closure pair via [`hook_fn`].
pub struct FnHook {
    name: String,
    acquire: Box<dyn Fn() -> BoxFuture<'static, Result<(), LifecycleError>> + Send + Sync>,
    release: Box<dyn Fn() -> BoxFuture<'static, Result<(), LifecycleError>> + Send + Sync>,
}

impl FnHook {
    /// Sets the hook name used in logs.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Adapts a pair of async closures into a [`StartupHook`].
///
/// # Example
///
/// ```rust,ignore
/// app.on_startup(
///     hook_fn(
///         || async { pool.connect().await.map_err(|e| LifecycleError::acquire("db", e)) },
///         || async { pool.disconnect().await; Ok(()) },
///     )
///     .named("db"),
/// );
/// ```
pub fn hook_fn<A, AFut, R, RFut>(acquire: A, release: R) -> FnHook
where
    A: Fn() -> AFut + Send + Sync + 'static,
    AFut: Future<Output = Result<(), LifecycleError>> + Send + 'static,
    R: Fn() -> RFut + Send + Sync + 'static,
    RFut: Future<Output = Result<(), LifecycleError>> + Send + 'static,
{
    FnHook {
        name: "startup-hook".to_string(),
        acquire: Box::new(move || Box::pin(acquire())),
        release: Box::new(move || Box::pin(release())),
    }
}

#[async_trait]
impl StartupHook for FnHook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(&self) -> Result<(), LifecycleError> {
        (self.acquire)().await
    }

    async fn release(&self) -> Result<(), LifecycleError> {
        (self.release)().await
    }
}

/// Lifecycle phases of a consumer run.
///
/// `Stopped` is terminal: a manager is not reusable after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Hooks may still be registered; nothing acquired.
    Idle,
    /// Acquiring hooks in registration order.
    Starting,
    /// All hooks acquired; the consumption loop may run.
    Running,
    /// Releasing hooks in reverse order.
    Stopping,
    /// Teardown finished.
    Stopped,
}

/// Ordered stack of startup hooks with strict reverse-order release.
pub struct LifecycleManager {
    hooks: Vec<Arc<dyn StartupHook>>,
    acquired: usize,
    state: LifecycleState,
}

impl LifecycleManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            hooks: Vec::new(),
            acquired: 0,
            state: LifecycleState::Idle,
        }
    }

    /// Registers a hook. Hooks acquire in registration order.
    pub fn register(&mut self, hook: impl StartupHook) {
        self.hooks.push(Arc::new(hook));
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Number of registered hooks.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Acquires every hook in registration order.
    ///
    /// If a hook fails to acquire, the already-acquired prefix is
    /// released in reverse order and the error is returned; the manager
    /// ends up `Stopped`.
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        if self.state != LifecycleState::Idle {
            return Err(LifecycleError::acquire(
                "lifecycle",
                format!("cannot start from state {:?}", self.state),
            ));
        }
        self.state = LifecycleState::Starting;

        for i in 0..self.hooks.len() {
            let hook = Arc::clone(&self.hooks[i]);
            if let Err(e) = hook.acquire().await {
                self.shutdown().await;
                return Err(e);
            }
            self.acquired = i + 1;
            debug!(hook = hook.name(), "startup hook acquired");
        }

        self.state = LifecycleState::Running;
        Ok(())
    }

    /// Releases every acquired hook in reverse order.
    ///
    /// Safe to call from any state; only hooks that actually acquired
    /// are released. Release failures are logged so later releases
    /// still run.
    pub async fn shutdown(&mut self) {
        if self.state == LifecycleState::Stopped {
            return;
        }
        self.state = LifecycleState::Stopping;

        while self.acquired > 0 {
            self.acquired -= 1;
            let hook = Arc::clone(&self.hooks[self.acquired]);
            match hook.release().await {
                Ok(()) => debug!(hook = hook.name(), "startup hook released"),
                Err(e) => warn!(hook = hook.name(), error = %e, "startup hook release failed"),
            }
        }

        self.state = LifecycleState::Stopped;
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("hooks", &self.hooks.len())
            .field("acquired", &self.acquired)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording_hook(log: Arc<Mutex<Vec<String>>>, name: &'static str, fail_acquire: bool) -> FnHook {
        let acquire_log = Arc::clone(&log);
        let release_log = log;
        hook_fn(
            move || {
                let log = Arc::clone(&acquire_log);
                async move {
                    if fail_acquire {
                        return Err(LifecycleError::acquire(name, "refused"));
                    }
                    log.lock().push(format!("{name}-acquire"));
                    Ok(())
                }
            },
            move || {
                let log = Arc::clone(&release_log);
                async move {
                    log.lock().push(format!("{name}-release"));
                    Ok(())
                }
            },
        )
        .named(name)
    }

    #[tokio::test]
    async fn releases_in_reverse_order_on_normal_completion() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = LifecycleManager::new();
        manager.register(recording_hook(Arc::clone(&log), "a", false));
        manager.register(recording_hook(Arc::clone(&log), "b", false));
        manager.register(recording_hook(Arc::clone(&log), "c", false));

        manager.start().await.unwrap();
        assert_eq!(manager.state(), LifecycleState::Running);
        manager.shutdown().await;

        assert_eq!(
            *log.lock(),
            vec![
                "a-acquire",
                "b-acquire",
                "c-acquire",
                "c-release",
                "b-release",
                "a-release"
            ]
        );
        assert_eq!(manager.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn acquire_failure_releases_only_the_acquired_prefix() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = LifecycleManager::new();
        manager.register(recording_hook(Arc::clone(&log), "a", false));
        manager.register(recording_hook(Arc::clone(&log), "b", false));
        manager.register(recording_hook(Arc::clone(&log), "c", true));

        let err = manager.start().await.unwrap_err();
        assert!(matches!(err, LifecycleError::Acquire { hook, .. } if hook == "c"));

        // c never acquired, so it does not release; a and b unwind in
        // reverse order.
        assert_eq!(
            *log.lock(),
            vec!["a-acquire", "b-acquire", "b-release", "a-release"]
        );
        assert_eq!(manager.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn release_failure_does_not_stop_later_releases() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = LifecycleManager::new();
        manager.register(recording_hook(Arc::clone(&log), "a", false));

        let fail_log = Arc::clone(&log);
        manager.register(
            hook_fn(
                {
                    let log = Arc::clone(&log);
                    move || {
                        let log = Arc::clone(&log);
                        async move {
                            log.lock().push("b-acquire".to_string());
                            Ok(())
                        }
                    }
                },
                move || {
                    let log = Arc::clone(&fail_log);
                    async move {
                        log.lock().push("b-release-failed".to_string());
                        Err(LifecycleError::release("b", "leak"))
                    }
                },
            )
            .named("b"),
        );

        manager.start().await.unwrap();
        manager.shutdown().await;

        assert_eq!(
            *log.lock(),
            vec!["a-acquire", "b-acquire", "b-release-failed", "a-release"]
        );
        assert_eq!(manager.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn stopped_manager_cannot_restart() {
        let mut manager = LifecycleManager::new();
        manager.start().await.unwrap();
        manager.shutdown().await;
        assert!(manager.start().await.is_err());
        assert_eq!(manager.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = LifecycleManager::new();
        manager.register(recording_hook(Arc::clone(&log), "a", false));

        manager.start().await.unwrap();
        manager.shutdown().await;
        manager.shutdown().await;

        assert_eq!(*log.lock(), vec!["a-acquire", "a-release"]);
    }
}
