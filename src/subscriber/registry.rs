//! Subscriber registry
//!
//! The registry is the composition surface: whatever mechanism discovers or
//! constructs subscribers inserts them here, and the session consumes the
//! registry only as an enumerable capability set when it starts. The
//! registry owns the identity allocator, so every subscriber it names gets a
//! unique, monotonic id.

use std::sync::{Arc, RwLock};

use crate::stream::StreamKind;

use super::identity::{IdentityAllocator, SubscriberId};
use super::record::Subscriber;

/// The set of subscribers supplied to a session
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    allocator: IdentityAllocator,
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
}

impl SubscriberRegistry {
    /// Create an empty registry with its own identity allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out an identity for a subscriber under construction
    pub fn allocate_id(&self) -> SubscriberId {
        self.allocator.allocate()
    }

    /// Insert a finished subscriber record
    pub fn insert(&self, subscriber: Arc<Subscriber>) {
        tracing::debug!(
            subscriber = %subscriber.id(),
            name = subscriber.name(),
            capabilities = ?subscriber.capabilities(),
            "subscriber registered"
        );
        self.subscribers.write().unwrap().push(subscriber);
    }

    /// Snapshot of every registered subscriber
    pub fn subscribers(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers.read().unwrap().clone()
    }

    /// Subscribers declaring the given capability
    pub fn with_capability(&self, kind: StreamKind) -> Vec<Arc<Subscriber>> {
        self.subscribers
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.has_capability(kind))
            .cloned()
            .collect()
    }

    /// Number of subscribers declaring the given capability
    pub fn capability_count(&self, kind: StreamKind) -> usize {
        self.subscribers
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.has_capability(kind))
            .count()
    }

    /// Look up a subscriber by identity
    pub fn get(&self, id: SubscriberId) -> Option<Arc<Subscriber>> {
        self.subscribers
            .read()
            .unwrap()
            .iter()
            .find(|s| s.id() == id)
            .cloned()
    }

    /// Total number of registered subscribers
    pub fn len(&self) -> usize {
        self.subscribers.read().unwrap().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().unwrap().is_empty()
    }
}
