//! # Rill Framework
//!
//! Handler, registry, and middleware layer for the Rill consumer
//! framework.
//!
//! This layer provides:
//! - [`Handler`] trait with Axum-style parameter binding for async
//!   functions (raw [`Message`](rill_core::Message) or typed
//!   [`Json<T>`] payloads)
//! - [`TopicRegistry`] mapping each topic to exactly one handler
//! - [`MiddlewareStack`] composing `(message, next)` wrappers around
//!   dispatch, with the built-in [`CatchErrors`] containment layer
//!
//! The framework layer knows nothing about brokers or lifecycles; the
//! consumption loop in `rill-runtime` drives it.

pub mod error;
pub mod extractor;
pub mod handler;
pub mod middleware;
pub mod registry;

pub use error::{DispatchError, DispatchResult, ExtractError, ExtractResult, RegistryError};
pub use extractor::{FromMessage, Json};
pub use handler::{BoxedHandler, Handler, IntoHandleResult, into_handler};
pub use middleware::{CatchErrors, DispatchFn, FnMiddleware, Middleware, MiddlewareStack, Next, from_fn};
pub use registry::TopicRegistry;
