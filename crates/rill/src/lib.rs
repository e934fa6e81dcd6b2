//! # Rill
//!
//! A lightweight, type-safe message consumer framework for Rust.
//!
//! ## Overview
//!
//! Rill lets an application declare topic handlers, cross-cutting
//! middleware, and startup/shutdown lifecycle hooks, then drives a
//! single sequential consumption loop that routes each incoming record
//! to the right handler with type-directed parameter binding.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌────────────────────────┐    ┌─────────────┐
//! │ BrokerClient │───▶│ ConsumerApp loop       │───▶│ Middleware  │──▶ Handler
//! │ (external)   │    │ (lifecycle-bracketed)  │    │ chain       │
//! └──────────────┘    └────────────────────────┘    └─────────────┘
//! ```
//!
//! - **rill-core**: `Message`, the `BrokerConsumer` capability trait,
//!   and an in-memory broker for demos and tests
//! - **rill-framework**: handlers with `FromMessage` parameter binding,
//!   the topic registry, and the middleware chain
//! - **rill-runtime**: `ConsumerApp`, lifecycle management, config,
//!   and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rill::prelude::*;
//!
//! #[derive(serde::Deserialize)]
//! struct Notification {
//!     email: String,
//!     subject: String,
//! }
//!
//! async fn send_email(Json(n): Json<Notification>) {
//!     println!("sending '{}' to {}", n.subject, n.email);
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = ConsumerApp::new(my_broker_client);
//!     app.middleware(CatchErrors::new());
//!     app.subscribe("send-email-notification", send_email)?;
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

pub use rill_core as core;
pub use rill_framework as framework;
pub use rill_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use rill::prelude::*;
/// ```
pub mod prelude {
    // Application - main entry point
    pub use rill_runtime::{ConsumerApp, RuntimeError, RuntimeResult};

    // Lifecycle hooks
    pub use rill_runtime::{LifecycleError, StartupHook, hook_fn};

    // Configuration and logging
    pub use rill_runtime::config::{ConfigLoader, RillConfig, load_config};
    pub use rill_runtime::logging::LoggingBuilder;

    // Handlers and parameter binding
    pub use rill_framework::{FromMessage, Handler, Json};

    // Middleware
    pub use rill_framework::{CatchErrors, Middleware, Next, from_fn};

    // Core types
    pub use rill_core::{BrokerConsumer, Message, RawRecord};
}
