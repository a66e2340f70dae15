//! Reader sets: per-stream-type fan-out
//!
//! One set exists per stream type the session needs. It owns the open
//! readers for that stream, keyed by subscriber identity, and confines its
//! side effects to those readers — it never touches another stream type.

use std::collections::HashMap;
use std::sync::Arc;

use crate::device::FrameSource;
use crate::error::{Error, Result};
use crate::stats::ReaderStatsSnapshot;
use crate::stream::reader::StreamReader;
use crate::stream::StreamKind;
use crate::subscriber::{Subscriber, SubscriberId};

/// The open readers for one stream type
#[derive(Debug)]
pub struct StreamReaderSet {
    kind: StreamKind,
    readers: HashMap<SubscriberId, StreamReader>,
}

impl StreamReaderSet {
    /// Create an empty set for one stream type
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            readers: HashMap::new(),
        }
    }

    /// The stream type this set manages
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Open a reader for every subscriber declaring this stream's capability
    ///
    /// Each opened reader gets the subscriber's callback wired in, the
    /// stream's frame description (and body capacity, if the source reports
    /// one) written back onto the subscriber record, and starts paused when
    /// the subscriber is inactive at open time. Registering a subscriber
    /// that already has a reader here is a programming error and fails
    /// loudly.
    pub fn open_for(&mut self, source: &FrameSource, subscribers: &[Arc<Subscriber>]) -> Result<()> {
        for subscriber in subscribers.iter().filter(|s| s.has_capability(self.kind)) {
            if self.readers.contains_key(&subscriber.id()) {
                return Err(Error::DuplicateSubscriber {
                    id: subscriber.id(),
                    kind: self.kind,
                });
            }

            let Some(callback) = subscriber.callback(self.kind) else {
                continue;
            };

            subscriber.set_frame_description(self.kind, source.description());
            if let Some(capacity) = source.body_capacity() {
                subscriber.set_body_capacity(capacity);
            }

            let start_paused = !subscriber.is_active();
            let reader = StreamReader::spawn(
                self.kind,
                subscriber.id(),
                source,
                callback,
                start_paused,
            );

            tracing::debug!(
                subscriber = %subscriber.id(),
                name = subscriber.name(),
                kind = %self.kind,
                paused = start_paused,
                "reader opened"
            );

            self.readers.insert(subscriber.id(), reader);
        }

        Ok(())
    }

    /// Pause, then release, every reader in the set
    ///
    /// Waits for each delivery task to finish, so no callback is in flight
    /// once this returns. Safe to call on an empty set.
    pub async fn close_all(&mut self) {
        for reader in self.readers.values() {
            reader.set_paused(true);
        }

        for (_, reader) in self.readers.drain() {
            reader.close().await;
        }

        tracing::debug!(kind = %self.kind, "reader set closed");
    }

    /// Flip the paused flag for one subscriber's reader
    ///
    /// Unknown subscriber identities are silently ignored.
    pub fn set_paused(&self, id: SubscriberId, paused: bool) {
        if let Some(reader) = self.readers.get(&id) {
            reader.set_paused(paused);
        }
    }

    /// Flip the paused flag for every reader in the set
    pub fn set_all_paused(&self, paused: bool) {
        for reader in self.readers.values() {
            reader.set_paused(paused);
        }
    }

    /// Whether one subscriber's reader is paused
    pub fn is_paused(&self, id: SubscriberId) -> Option<bool> {
        self.readers.get(&id).map(|r| r.is_paused())
    }

    /// Delivery counters for one subscriber's reader
    pub fn stats(&self, id: SubscriberId) -> Option<ReaderStatsSnapshot> {
        self.readers.get(&id).map(|r| r.stats())
    }

    /// Whether a subscriber has an open reader here
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.readers.contains_key(&id)
    }

    /// Number of open readers
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    /// Whether the set has no open readers
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use bytes::Bytes;

    use crate::stream::{FrameDescription, SensorFrame};
    use crate::subscriber::SubscriberRegistry;

    use super::*;

    fn depth_source() -> FrameSource {
        FrameSource::new(
            StreamKind::Depth,
            FrameDescription::new(4, 1, 2),
            None,
            16,
        )
    }

    fn depth_frame() -> SensorFrame {
        SensorFrame::samples(
            StreamKind::Depth,
            0,
            FrameDescription::new(4, 1, 2),
            Bytes::from(vec![0u8; 8]),
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_open_then_close_empties_the_set() {
        let registry = SubscriberRegistry::new();
        let sub = Subscriber::builder(registry.allocate_id(), "viewer")
            .on_depth(|_| {})
            .build();
        registry.insert(Arc::clone(&sub));

        let source = depth_source();
        let mut set = StreamReaderSet::new(StreamKind::Depth);

        set.open_for(&source, &registry.subscribers()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(
            sub.frame_description(StreamKind::Depth),
            Some(FrameDescription::new(4, 1, 2))
        );

        set.close_all().await;
        assert!(set.is_empty());

        // Teardown is idempotent-safe and the set can be reused.
        set.close_all().await;
        set.open_for(&source, &registry.subscribers()).unwrap();
        assert_eq!(set.len(), 1);
        set.close_all().await;
    }

    #[tokio::test]
    async fn test_duplicate_registration_fails() {
        let registry = SubscriberRegistry::new();
        let sub = Subscriber::builder(registry.allocate_id(), "viewer")
            .on_depth(|_| {})
            .build();

        let source = depth_source();
        let mut set = StreamReaderSet::new(StreamKind::Depth);

        set.open_for(&source, &[Arc::clone(&sub)]).unwrap();
        let result = set.open_for(&source, &[Arc::clone(&sub)]);

        assert!(matches!(
            result,
            Err(Error::DuplicateSubscriber { .. })
        ));

        set.close_all().await;
    }

    #[tokio::test]
    async fn test_frames_reach_the_callback() {
        let registry = SubscriberRegistry::new();
        let received = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&received);
        let sub = Subscriber::builder(registry.allocate_id(), "viewer")
            .on_depth(move |frame| {
                if frame.acquire().is_some() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build();
        let id = sub.id();

        let source = depth_source();
        let mut set = StreamReaderSet::new(StreamKind::Depth);
        set.open_for(&source, &[sub]).unwrap();

        settle().await;
        source.publish(depth_frame());
        source.publish(depth_frame());
        settle().await;

        assert_eq!(received.load(Ordering::SeqCst), 2);
        assert_eq!(set.stats(id).unwrap().delivered, 2);

        set.close_all().await;
    }

    #[tokio::test]
    async fn test_paused_reader_skips_frames() {
        let registry = SubscriberRegistry::new();
        let received = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&received);
        let sub = Subscriber::builder(registry.allocate_id(), "viewer")
            .on_depth(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        let id = sub.id();

        let source = depth_source();
        let mut set = StreamReaderSet::new(StreamKind::Depth);
        set.open_for(&source, &[sub]).unwrap();

        settle().await;
        set.set_paused(id, true);
        source.publish(depth_frame());
        settle().await;
        assert_eq!(received.load(Ordering::SeqCst), 0);

        set.set_paused(id, false);
        source.publish(depth_frame());
        settle().await;
        assert_eq!(received.load(Ordering::SeqCst), 1);

        // Unknown ids are a silent no-op.
        set.set_paused(registry.allocate_id(), true);

        set.close_all().await;
    }

    #[tokio::test]
    async fn test_inactive_subscriber_starts_paused() {
        let registry = SubscriberRegistry::new();
        let sub = Subscriber::builder(registry.allocate_id(), "idle")
            .active(false)
            .on_depth(|_| {})
            .build();
        let id = sub.id();

        let mut set = StreamReaderSet::new(StreamKind::Depth);
        set.open_for(&depth_source(), &[sub]).unwrap();

        assert_eq!(set.is_paused(id), Some(true));

        set.close_all().await;
    }
}
