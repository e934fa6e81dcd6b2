//! Runtime error types.

use thiserror::Error;

use crate::lifecycle::LifecycleError;
use rill_core::BrokerError;
use rill_framework::DispatchError;

/// Errors that can occur while running the consumer application.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// `run()` was called with an empty topic registry.
    #[error("no topics registered; register at least one handler before running")]
    NoTopics,

    /// A consumed record's topic has no handler. The subscription is
    /// derived from the registry, so this is an invariant violation and
    /// fatal.
    #[error("no handler registered for topic '{0}'")]
    MissingHandler(String),

    /// The broker client failed at the connection level.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// A startup hook failed to acquire.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A dispatch error escaped the middleware chain.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
