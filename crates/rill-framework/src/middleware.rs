//! Middleware chain wrapping every dispatch.
//!
//! A middleware receives the message and a [`Next`] handle to the rest
//! of the chain. It decides whether and when to call `next`: it can
//! transform the message, short-circuit without calling `next`, catch
//! the error `next` returns, or (unusual but permitted) call `next`
//! more than once.
//!
//! The chain is composed once, when the application starts, by
//! [`MiddlewareStack::wrap`]; the first registered middleware becomes
//! the outermost wrapper. No per-message re-composition happens.
//!
//! The consumption loop itself contains no error handling: all
//! per-message fault tolerance is middleware's responsibility. The
//! built-in [`CatchErrors`] is the stock containment layer.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::error;

use crate::error::DispatchResult;
use crate::handler::BoxedHandler;
use rill_core::Message;

/// A composed dispatch function: the terminal handler with zero or more
/// middleware wrapped around it.
pub type DispatchFn = BoxedHandler;

/// Handle to the remainder of the middleware chain.
///
/// Cheap to clone; calling [`run`](Next::run) consumes the handle, so a
/// middleware that wants to invoke the rest of the chain twice clones
/// it first.
#[derive(Clone)]
pub struct Next {
    inner: DispatchFn,
}

impl Next {
    /// Invokes the rest of the chain with the given message.
    pub async fn run(self, message: Message) -> DispatchResult<()> {
        (self.inner)(message).await
    }
}

/// A composable wrapper around message dispatch.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Processes one message, calling `next` to continue the chain.
    async fn handle(&self, message: Message, next: Next) -> DispatchResult<()>;
}

// ============================================================================
// Function middleware
// ============================================================================

/// A middleware built from an async closure via [`from_fn`].
pub struct FnMiddleware {
    f: Box<dyn Fn(Message, Next) -> BoxFuture<'static, DispatchResult<()>> + Send + Sync>,
}

/// Adapts an async closure `(Message, Next) -> DispatchResult<()>` into
/// a [`Middleware`].
///
/// # Example
///
/// ```rust,ignore
/// let timing = from_fn(|message, next: Next| async move {
///     let start = std::time::Instant::now();
///     let result = next.run(message).await;
///     tracing::debug!(elapsed = ?start.elapsed(), "dispatch finished");
///     result
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FnMiddleware
where
    F: Fn(Message, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult<()>> + Send + 'static,
{
    FnMiddleware {
        f: Box::new(move |message, next| Box::pin(f(message, next))),
    }
}

#[async_trait]
impl Middleware for FnMiddleware {
    async fn handle(&self, message: Message, next: Next) -> DispatchResult<()> {
        (self.f)(message, next).await
    }
}

// ============================================================================
// MiddlewareStack
// ============================================================================

/// The ordered middleware chain. Insertion order is wrap order: the
/// first pushed middleware ends up outermost.
#[derive(Default, Clone)]
pub struct MiddlewareStack {
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Appends a middleware to the chain.
    pub fn push(&mut self, middleware: impl Middleware) {
        self.layers.push(Arc::new(middleware));
    }

    /// Number of registered middleware.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Composes the chain around a terminal dispatch function.
    ///
    /// Called once after registration closes; the returned function is
    /// reused for every message routed to that handler.
    pub fn wrap(&self, terminal: DispatchFn) -> DispatchFn {
        let mut dispatch = terminal;
        for layer in self.layers.iter().rev() {
            let layer = Arc::clone(layer);
            let inner = dispatch;
            dispatch = Arc::new(move |message: Message| -> BoxFuture<'static, DispatchResult<()>> {
                let layer = Arc::clone(&layer);
                let next = Next {
                    inner: Arc::clone(&inner),
                };
                Box::pin(async move { layer.handle(message, next).await })
            });
        }
        dispatch
    }
}

impl std::fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareStack")
            .field("layers", &self.layers.len())
            .finish()
    }
}

// ============================================================================
// Built-in middleware
// ============================================================================

/// Error-containment middleware: logs any error propagating from the
/// rest of the chain and swallows it, so the consumption loop continues
/// with the next record.
///
/// This is the framework's only built-in failure-containment point.
/// Without it (or an equivalent), a single bad message is fatal to the
/// whole run.
#[derive(Debug, Default, Clone, Copy)]
pub struct CatchErrors;

impl CatchErrors {
    /// Creates the middleware.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for CatchErrors {
    async fn handle(&self, message: Message, next: Next) -> DispatchResult<()> {
        let topic = message.topic().to_string();
        if let Err(e) = next.run(message).await {
            error!(topic = %topic, error = %e, "message dropped after handler failure");
        }
        Ok(())
    }
}
