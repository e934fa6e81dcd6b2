//! # Rill Core
//!
//! Foundation types for the Rill consumer framework.
//!
//! This crate defines the shared currency between the broker layer and
//! the handler layer:
//!
//! - [`Message`] — one consumed record (topic, key bytes, value bytes)
//! - [`BrokerConsumer`] — the capability surface a broker client must
//!   provide (subscribe, blocking batch consume, idempotent close)
//! - [`RawRecord`] — a delivered record or a per-record broker error
//! - [`MemoryBroker`] — a channel-backed consumer for demos and tests
//!
//! Everything above this crate (parameter binding, registries,
//! middleware, the consumption loop) lives in `rill-framework` and
//! `rill-runtime`.

pub mod broker;
pub mod memory;
pub mod message;

pub use broker::{
    BoxedConsumer, BrokerConsumer, BrokerError, BrokerRecord, BrokerResult, RawRecord, RecordError,
};
pub use memory::{MemoryBroker, MemoryProducer, memory_broker};
pub use message::Message;
