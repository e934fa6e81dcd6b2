//! # Rill Runtime
//!
//! Orchestration layer for the Rill consumer framework.
//!
//! This crate provides:
//! - [`ConsumerApp`] — the registration API (startup hooks, middleware,
//!   topic handlers) and the consumption loop behind `run()`
//! - [`LifecycleManager`] — ordered acquire, strict reverse-order
//!   release around the loop's lifetime
//! - Configuration loading ([`config`]) and logging setup ([`logging`])
//!
//! # Example
//!
//! ```rust,ignore
//! use rill_runtime::{ConsumerApp, config::load_config};
//! use rill_framework::{CatchErrors, Json};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config()?;
//!     let mut app = ConsumerApp::from_config(&config, my_broker_client);
//!
//!     app.middleware(CatchErrors::new());
//!     app.subscribe("send-email-notification", send_email)?;
//!
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;

pub use app::ConsumerApp;
pub use config::{BrokerConfig, ConfigError, ConfigLoader, ConfigResult, LogFormat, LoggingConfig, RillConfig, load_config};
pub use error::{RuntimeError, RuntimeResult};
pub use lifecycle::{FnHook, LifecycleError, LifecycleManager, LifecycleState, StartupHook, hook_fn};
pub use logging::LoggingBuilder;

// Re-export tracing for use by applications
pub use tracing;
