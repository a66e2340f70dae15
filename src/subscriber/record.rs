//! Subscriber records
//!
//! A subscriber is a consumer of one or more stream types. Its capability set
//! is an explicit map from stream kind to frame callback, declared up front
//! through the builder; there is no runtime type inspection. Once the
//! session opens a reader for a capability, the stream's frame description
//! (and, for body streams, the tracked-body capacity) is written back onto
//! the record for the consumer to read.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::stream::{FrameDescription, FrameRef, StreamKind};

/// Callback invoked once per delivered frame
///
/// Invoked synchronously on the reader's delivery task; the next frame for
/// the same reader is not delivered until the callback returns. A callback
/// may capture a channel sender instead of doing work inline.
pub type FrameCallback = Arc<dyn Fn(FrameRef) + Send + Sync>;

/// A consumer of one or more stream types
pub struct Subscriber {
    id: super::SubscriberId,
    name: String,
    active: AtomicBool,
    callbacks: HashMap<StreamKind, FrameCallback>,
    descriptions: Mutex<HashMap<StreamKind, FrameDescription>>,
    // 0 means "not yet reported"; a body reader sets this at open time.
    body_capacity: AtomicUsize,
}

impl Subscriber {
    /// Start building a subscriber with the given identity
    pub fn builder(id: super::SubscriberId, name: impl Into<String>) -> SubscriberBuilder {
        SubscriberBuilder {
            id,
            name: name.into(),
            active: true,
            callbacks: HashMap::new(),
        }
    }

    /// This subscriber's identity
    pub fn id(&self) -> super::SubscriberId {
        self.id
    }

    /// Human-readable name, used in log fields
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the subscriber wants frames right now
    ///
    /// Readers opened while the subscriber is inactive start paused. Flipping
    /// the flag mid-session does not touch open readers; route that through
    /// [`DeviceSession::pause`](crate::device::DeviceSession::pause) and
    /// [`resume`](crate::device::DeviceSession::resume).
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Set the active flag
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Whether this subscriber declares the given capability
    pub fn has_capability(&self, kind: StreamKind) -> bool {
        self.callbacks.contains_key(&kind)
    }

    /// The declared capabilities, in [`StreamKind::ALL`] order
    pub fn capabilities(&self) -> Vec<StreamKind> {
        StreamKind::ALL
            .into_iter()
            .filter(|kind| self.has_capability(*kind))
            .collect()
    }

    pub(crate) fn callback(&self, kind: StreamKind) -> Option<FrameCallback> {
        self.callbacks.get(&kind).cloned()
    }

    /// Frame description reported when this subscriber's reader opened
    pub fn frame_description(&self, kind: StreamKind) -> Option<FrameDescription> {
        self.descriptions.lock().unwrap().get(&kind).copied()
    }

    pub(crate) fn set_frame_description(&self, kind: StreamKind, description: FrameDescription) {
        self.descriptions.lock().unwrap().insert(kind, description);
    }

    /// Tracked-body capacity reported when this subscriber's body reader opened
    pub fn body_capacity(&self) -> Option<usize> {
        match self.body_capacity.load(Ordering::Acquire) {
            0 => None,
            n => Some(n),
        }
    }

    pub(crate) fn set_body_capacity(&self, capacity: usize) {
        self.body_capacity.store(capacity, Ordering::Release);
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.is_active())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Builder for [`Subscriber`]
pub struct SubscriberBuilder {
    id: super::SubscriberId,
    name: String,
    active: bool,
    callbacks: HashMap<StreamKind, FrameCallback>,
}

impl SubscriberBuilder {
    /// Set the initial active flag (default true)
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Declare a capability with its frame callback
    pub fn on_frame(
        mut self,
        kind: StreamKind,
        callback: impl Fn(FrameRef) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.insert(kind, Arc::new(callback));
        self
    }

    /// Declare the infrared capability
    pub fn on_infrared(self, callback: impl Fn(FrameRef) + Send + Sync + 'static) -> Self {
        self.on_frame(StreamKind::Infrared, callback)
    }

    /// Declare the color capability
    pub fn on_color(self, callback: impl Fn(FrameRef) + Send + Sync + 'static) -> Self {
        self.on_frame(StreamKind::Color, callback)
    }

    /// Declare the depth capability
    pub fn on_depth(self, callback: impl Fn(FrameRef) + Send + Sync + 'static) -> Self {
        self.on_frame(StreamKind::Depth, callback)
    }

    /// Declare the body-index capability
    pub fn on_body_index(self, callback: impl Fn(FrameRef) + Send + Sync + 'static) -> Self {
        self.on_frame(StreamKind::BodyIndex, callback)
    }

    /// Declare the body capability
    pub fn on_body(self, callback: impl Fn(FrameRef) + Send + Sync + 'static) -> Self {
        self.on_frame(StreamKind::Body, callback)
    }

    /// Finish the record
    pub fn build(self) -> Arc<Subscriber> {
        Arc::new(Subscriber {
            id: self.id,
            name: self.name,
            active: AtomicBool::new(self.active),
            callbacks: self.callbacks,
            descriptions: Mutex::new(HashMap::new()),
            body_capacity: AtomicUsize::new(0),
        })
    }
}
