//! Broker-client capability surface.
//!
//! The framework never talks to a broker directly. It consumes through
//! the [`BrokerConsumer`] trait, which captures the minimal capability
//! set it needs: subscribe to a topic list, pull the next batch of raw
//! records, and close the connection. Offset management, partition
//! assignment, and commit policy stay inside the concrete client.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Message;

/// Errors reported by a broker client at the connection level.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    /// Establishing or using the connection failed.
    #[error("broker connection failed: {0}")]
    Connection(String),

    /// The subscribe call was rejected.
    #[error("failed to subscribe: {0}")]
    Subscribe(String),

    /// Pulling the next batch failed.
    #[error("failed to consume: {0}")]
    Consume(String),

    /// The consumer has been closed.
    #[error("consumer is closed")]
    Closed,
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// A successfully delivered record.
#[derive(Debug, Clone)]
pub struct BrokerRecord {
    /// Topic the record was delivered on.
    pub topic: String,
    /// Record key; empty when the broker delivered none.
    pub key: Vec<u8>,
    /// Record payload bytes.
    pub value: Vec<u8>,
}

impl BrokerRecord {
    /// Converts this record into the [`Message`] handed to handlers.
    pub fn into_message(self) -> Message {
        Message::new(self.topic, self.key, self.value)
    }
}

/// A per-record delivery error reported by the broker inside a batch.
///
/// These are non-fatal: the consumption loop logs them and moves on to
/// the next record. The failed record is dropped, never retried.
#[derive(Debug, Clone)]
pub struct RecordError {
    /// Topic of the failed record, when the broker knows it.
    pub topic: Option<String>,
    /// Broker-supplied description of the failure.
    pub reason: String,
}

/// One unit of a consumed batch: either a delivered record or a
/// broker-reported per-record error.
#[derive(Debug, Clone)]
pub enum RawRecord {
    /// A record that was delivered successfully.
    Record(BrokerRecord),
    /// A delivery failure for a single record.
    Error(RecordError),
}

impl RawRecord {
    /// Builds a delivered record.
    pub fn record(
        topic: impl Into<String>,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self::Record(BrokerRecord {
            topic: topic.into(),
            key: key.into(),
            value: value.into(),
        })
    }

    /// Builds a per-record error.
    pub fn error(topic: Option<String>, reason: impl Into<String>) -> Self {
        Self::Error(RecordError {
            topic,
            reason: reason.into(),
        })
    }
}

/// The consuming side of a broker client.
///
/// Implementations wrap a concrete client (a Kafka consumer, an
/// in-process channel, a test double). The runtime owns the consumer
/// exclusively: no other component touches it.
#[async_trait]
pub trait BrokerConsumer: Send + Sync + 'static {
    /// Subscribes to the given topics. Called once, before the first
    /// [`consume`](Self::consume).
    async fn subscribe(&self, topics: &[String]) -> BrokerResult<()>;

    /// Pulls the next batch of raw records, waiting until data is
    /// available. Batch size and blocking behavior are the client's
    /// own policy.
    async fn consume(&self) -> BrokerResult<Vec<RawRecord>>;

    /// Closes the connection. Must be idempotent.
    async fn close(&self);
}

/// A shared, type-erased broker consumer.
pub type BoxedConsumer = Arc<dyn BrokerConsumer>;
