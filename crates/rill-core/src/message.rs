//! The message value type shared between the broker layer and handlers.

use std::fmt;

/// A single consumed record: topic name, key bytes, and value bytes.
///
/// A `Message` is built once per incoming broker record and handed by
/// value through the middleware chain to the handler that processes it.
/// It is immutable after construction; cloning copies the byte buffers,
/// which is acceptable because a message is owned by exactly one
/// dispatch call.
///
/// Records without a key map to an empty key.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    topic: String,
    key: Vec<u8>,
    value: Vec<u8>,
}

impl Message {
    /// Creates a message from its parts.
    pub fn new(topic: impl Into<String>, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// The topic this message was consumed from.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The record key. Empty if the broker delivered no key.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The raw payload bytes. Opaque to the framework; a handler's
    /// declared payload type decides how they are decoded.
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("topic", &self.topic)
            .field("key_len", &self.key.len())
            .field("value_len", &self.value.len())
            .finish()
    }
}
