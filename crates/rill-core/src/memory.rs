//! In-process broker backed by a channel.
//!
//! [`MemoryBroker`] implements [`BrokerConsumer`] over a tokio mpsc
//! channel. It exists for demos and tests: a [`MemoryProducer`] feeds
//! record batches from the same process, and the consumption loop pulls
//! them exactly as it would from a real client.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc};

use crate::broker::{BrokerConsumer, BrokerError, BrokerResult, RawRecord};

/// Creates a connected producer/consumer pair.
pub fn memory_broker() -> (MemoryProducer, MemoryBroker) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        MemoryProducer { tx },
        MemoryBroker {
            rx: AsyncMutex::new(rx),
            subscriptions: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        },
    )
}

/// The feeding side of a [`MemoryBroker`].
///
/// Dropping every producer ends the stream: the consumer's next pull
/// reports [`BrokerError::Closed`].
#[derive(Clone)]
pub struct MemoryProducer {
    tx: mpsc::UnboundedSender<Vec<RawRecord>>,
}

impl MemoryProducer {
    /// Sends one delivered record as a single-element batch.
    pub fn send_record(
        &self,
        topic: impl Into<String>,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) {
        self.send_batch(vec![RawRecord::record(topic, key, value)]);
    }

    /// Sends one per-record error as a single-element batch.
    pub fn send_error(&self, topic: Option<String>, reason: impl Into<String>) {
        self.send_batch(vec![RawRecord::error(topic, reason)]);
    }

    /// Sends a whole batch, delivered to exactly one `consume` call.
    pub fn send_batch(&self, batch: Vec<RawRecord>) {
        // The consumer may already be gone during shutdown; nothing to do.
        let _ = self.tx.send(batch);
    }
}

/// A [`BrokerConsumer`] reading batches from an in-process channel.
pub struct MemoryBroker {
    rx: AsyncMutex<mpsc::UnboundedReceiver<Vec<RawRecord>>>,
    subscriptions: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MemoryBroker {
    /// Topics passed to [`subscribe`](BrokerConsumer::subscribe).
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().clone()
    }

    /// Whether [`close`](BrokerConsumer::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerConsumer for MemoryBroker {
    async fn subscribe(&self, topics: &[String]) -> BrokerResult<()> {
        if self.is_closed() {
            return Err(BrokerError::Closed);
        }
        *self.subscriptions.lock() = topics.to_vec();
        Ok(())
    }

    async fn consume(&self) -> BrokerResult<Vec<RawRecord>> {
        if self.is_closed() {
            return Err(BrokerError::Closed);
        }
        match self.rx.lock().await.recv().await {
            Some(batch) => Ok(batch),
            None => Err(BrokerError::Closed),
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
