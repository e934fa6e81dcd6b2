//! Handler system for the Rill framework.
//!
//! This module defines the [`Handler`] trait that topic callbacks are
//! registered through. Handlers are plain async functions; blanket
//! implementations cover arities from zero up to eight parameters,
//! each parameter implementing [`FromMessage`], similar to Axum's
//! handler system.
//!
//! # Example
//!
//! ```rust,ignore
//! use rill_framework::{Json, Handler};
//! use rill_core::Message;
//!
//! // Zero-parameter handler
//! async fn heartbeat() {}
//!
//! // Raw-message handler
//! async fn audit(message: Message) {
//!     println!("{} bytes on {}", message.value().len(), message.topic());
//! }
//!
//! // Typed-payload handler with a fallible body
//! async fn send_email(Json(n): Json<Notification>) -> Result<(), SmtpError> {
//!     // ...
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::{DispatchError, DispatchResult};
use crate::extractor::FromMessage;
use rill_core::Message;

// ============================================================================
// IntoHandleResult - Handle handler return values
// ============================================================================

/// A trait for types a handler may return.
pub trait IntoHandleResult: Send {
    /// Converts the return value into the dispatch outcome.
    fn into_handle_result(self) -> DispatchResult<()>;
}

/// Implementation for `()` - the handler cannot fail.
impl IntoHandleResult for () {
    fn into_handle_result(self) -> DispatchResult<()> {
        Ok(())
    }
}

/// Implementation for `Result<(), E>` - an `Err` becomes a handler
/// execution error and propagates out of the dispatch call.
impl<E> IntoHandleResult for Result<(), E>
where
    E: std::fmt::Display + Send,
{
    fn into_handle_result(self) -> DispatchResult<()> {
        self.map_err(DispatchError::handler)
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for topic handlers.
///
/// # Blanket Implementation
///
/// This trait is automatically implemented for async functions that:
/// - Take 0-8 parameters that implement [`FromMessage`]
/// - Return `()` or `Result<(), E: Display>`
///
/// Parameters are extracted in declared order; if any extraction fails
/// the callback is not invoked and the error propagates. The returned
/// future is awaited to completion before `call` returns, so dispatch
/// stays strictly sequential.
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Call the handler with the given message.
    async fn call(self, message: Message) -> DispatchResult<()>;
}

// ============================================================================
// BoxedHandler - Type-erased handler stored in the registry
// ============================================================================

/// A type-erased handler that can be stored in the topic registry.
///
/// Internally a closure that captures the original handler and calls it
/// with a cloned copy on each invocation.
pub type BoxedHandler =
    Arc<dyn Fn(Message) -> BoxFuture<'static, DispatchResult<()>> + Send + Sync>;

/// Convert a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T> + Send + Sync + 'static,
    T: 'static,
{
    Arc::new(move |message| f.clone().call(message))
}

// ============================================================================
// Handler implementations for functions (Axum-style)
// ============================================================================

/// Macro to generate Handler implementations for functions with different arities.
macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: IntoHandleResult + 'static,
            $( $ty: FromMessage + Send + 'static, )*
        {
            async fn call(self, message: Message) -> DispatchResult<()> {
                $(
                    let $ty = $ty::from_message(&message)?;
                )*

                (self)($($ty,)*).await.into_handle_result()
            }
        }
    };
}

// Generate implementations for 0-8 parameters
impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::extractor::Json;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    struct Notification {
        email: String,
    }

    #[tokio::test]
    async fn zero_parameter_handler_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let handler = into_handler(move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        handler(Message::new("t", Vec::new(), Vec::new()))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn raw_message_handler_sees_the_message_unchanged() {
        let seen = Arc::new(support::Slot::default());
        let seen_clone = Arc::clone(&seen);
        let handler = into_handler(move |message: Message| {
            let seen = Arc::clone(&seen_clone);
            async move {
                seen.set(message);
            }
        });

        let original = Message::new("audit", b"key".to_vec(), b"value".to_vec());
        handler(original.clone()).await.unwrap();
        assert_eq!(seen.take(), Some(original));
    }

    #[tokio::test]
    async fn typed_handler_decodes_payload() {
        let seen = Arc::new(support::Slot::default());
        let seen_clone = Arc::clone(&seen);
        let handler = into_handler(move |Json(n): Json<Notification>| {
            let seen = Arc::clone(&seen_clone);
            async move {
                seen.set(n);
            }
        });

        handler(Message::new(
            "notify",
            Vec::new(),
            br#"{"email":"a@b.c"}"#.to_vec(),
        ))
        .await
        .unwrap();
        assert_eq!(
            seen.take(),
            Some(Notification {
                email: "a@b.c".to_string()
            })
        );
    }

    #[tokio::test]
    async fn malformed_payload_skips_the_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let handler = into_handler(move |Json(_n): Json<Notification>| {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        let err = handler(Message::new("notify", Vec::new(), b"garbage".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Extract(ExtractError::PayloadDecode { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_error_surfaces_as_handler_variant() {
        let handler =
            into_handler(|_message: Message| async move { Err::<(), _>("smtp unreachable") });

        let err = handler(Message::new("t", Vec::new(), Vec::new()))
            .await
            .unwrap_err();
        match err {
            DispatchError::Handler(reason) => assert_eq!(reason, "smtp unreachable"),
            other => panic!("unexpected error: {other}"),
        }
    }

    /// Minimal single-value cell for observing what a handler received.
    mod support {
        use std::sync::Mutex;

        pub struct Slot<T>(Mutex<Option<T>>);

        impl<T> Default for Slot<T> {
            fn default() -> Self {
                Slot(Mutex::new(None))
            }
        }

        impl<T> Slot<T> {
            pub fn set(&self, value: T) {
                *self.0.lock().unwrap() = Some(value);
            }

            pub fn take(&self) -> Option<T> {
                self.0.lock().unwrap().take()
            }
        }
    }
}
