//! Topic registry: the mapping from topic name to handler.
//!
//! Registrations are append-only for the process lifetime and happen
//! strictly before the consumption loop starts, so the registry is
//! shared read-only during the run phase and needs no locking.

use std::collections::HashMap;

use crate::error::RegistryError;
use crate::handler::{BoxedHandler, Handler, into_handler};

/// Maps each topic to exactly one handler.
#[derive(Default, Clone)]
pub struct TopicRegistry {
    handlers: HashMap<String, BoxedHandler>,
}

impl TopicRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler for a topic.
    ///
    /// Fails with [`RegistryError::DuplicateTopic`] if the topic already
    /// has a handler; the prior registration stays intact. There is no
    /// removal operation.
    pub fn register<H, T>(&mut self, topic: impl Into<String>, handler: H) -> Result<(), RegistryError>
    where
        H: Handler<T>,
        T: 'static,
    {
        let topic = topic.into();
        if self.handlers.contains_key(&topic) {
            return Err(RegistryError::DuplicateTopic(topic));
        }
        self.handlers.insert(topic, into_handler(handler));
        Ok(())
    }

    /// The registered topic names, sorted. Drives the broker
    /// subscription.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.handlers.keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Looks up the handler for a topic.
    pub fn get(&self, topic: &str) -> Option<BoxedHandler> {
        self.handlers.get(topic).cloned()
    }

    /// Iterates over `(topic, handler)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoxedHandler)> {
        self.handlers.iter().map(|(t, h)| (t.as_str(), h))
    }

    /// Number of registered topics.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no topic has been registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for TopicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicRegistry")
            .field("topics", &self.topics())
            .finish()
    }
}
