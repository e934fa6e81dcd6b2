//! Error types for the Rill framework layer.

use thiserror::Error;

/// Errors that can occur while binding handler parameters.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The message payload could not be decoded into the handler's
    /// declared type.
    #[error("failed to decode payload on topic '{topic}': {reason}")]
    PayloadDecode {
        /// Topic of the offending message.
        topic: String,
        /// Decoder description of the failure.
        reason: String,
    },

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that can escape a dispatch call.
///
/// The consumption loop installs no containment of its own: a
/// `DispatchError` that no middleware catches is fatal to the run.
/// The built-in [`CatchErrors`](crate::middleware::CatchErrors)
/// middleware is the designated place to intercept these.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Parameter binding failed before the handler was invoked.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The handler ran and returned an error.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl DispatchError {
    /// Creates a handler execution error from a displayable cause.
    pub fn handler(cause: impl std::fmt::Display) -> Self {
        Self::Handler(cause.to_string())
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised while registering handlers.
///
/// These are configuration errors: they surface at startup, before
/// `run()`, never as a runtime state.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A handler is already registered for the topic.
    #[error("topic '{0}' is already registered")]
    DuplicateTopic(String),
}
