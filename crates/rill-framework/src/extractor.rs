//! Parameter binding for handler functions.
//!
//! A handler's parameter types decide, once, at registration time, what
//! each parameter is bound to when a message arrives:
//!
//! - [`Message`] — the raw message itself, unchanged
//! - [`Json<T>`] — the payload bytes decoded into `T` via serde
//!
//! The binding is encoded entirely in the function signature, so there
//! is no per-message type inspection; dispatch only runs the extractors
//! the signature already selected.

use serde::de::DeserializeOwned;

use crate::error::{ExtractError, ExtractResult};
use rill_core::Message;

/// A trait for types that can be extracted from a [`Message`].
///
/// Types implementing this trait can be used directly as handler
/// function parameters.
///
/// # Error Handling
///
/// Extraction can fail, typically because the payload bytes do not
/// decode into the declared type. A failed extraction means the handler
/// is never invoked; the error propagates out of the dispatch call for
/// middleware to catch.
pub trait FromMessage: Sized {
    /// Attempts to extract this type from the given message.
    fn from_message(message: &Message) -> ExtractResult<Self>;
}

/// Raw-message binding: the handler receives the message unchanged.
impl FromMessage for Message {
    fn from_message(message: &Message) -> ExtractResult<Self> {
        Ok(message.clone())
    }
}

/// Implementation for `Option<T>` where `T: FromMessage`.
///
/// Allows a handler to accept a payload that may not decode, observing
/// `None` instead of failing the dispatch.
impl<T: FromMessage> FromMessage for Option<T> {
    fn from_message(message: &Message) -> ExtractResult<Self> {
        Ok(T::from_message(message).ok())
    }
}

/// Typed-payload binding: decodes the message value as JSON into `T`.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(serde::Deserialize)]
/// struct Notification {
///     email: String,
///     subject: String,
///     content: String,
/// }
///
/// async fn send_email(Json(notification): Json<Notification>) {
///     // notification is a decoded Notification
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Consumes the wrapper, returning the decoded payload.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: DeserializeOwned> FromMessage for Json<T> {
    fn from_message(message: &Message) -> ExtractResult<Self> {
        serde_json::from_slice(message.value())
            .map(Json)
            .map_err(|e| ExtractError::PayloadDecode {
                topic: message.topic().to_string(),
                reason: e.to_string(),
            })
    }
}
