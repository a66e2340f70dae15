//! Device session: lifecycle state machine and reader orchestration
//!
//! The session is the single binding to the physical device. It decides
//! which stream types to enable from the subscriber capability counts, opens
//! one reader set per needed stream, and walks the lifecycle:
//!
//! ```text
//!   Uninitialized ──start()──► Started ──shutdown()──► Shutdown
//!                                │  ▲
//!                                └──┘ restart()
//! ```
//!
//! The explicit gate prevents double-initialization of the device handle; a
//! session that has shut down is finished, and a fresh session must be
//! created to use the device again. `restart()` reuses the needed-stream
//! flags captured at `start()` — subscribers added in between are not picked
//! up until a fresh session starts.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::color::RangeColorizer;
use crate::error::{Error, Result};
use crate::mapping::CoordinateMapper;
use crate::stats::ReaderStatsSnapshot;
use crate::stream::{StreamKind, StreamReaderSet};
use crate::subscriber::{Subscriber, SubscriberId, SubscriberRegistry};

use super::config::SessionConfig;
use super::sensor::SensorDevice;
use super::status::{DeviceState, StatusMessage};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created, device not yet opened
    Uninitialized,
    /// Device open, readers running
    Started,
    /// Device released for good
    Shutdown,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Started => "started",
            SessionPhase::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

// Which stream types at least one subscriber asked for. Computed once at
// start() and reused verbatim by restart().
#[derive(Debug, Clone, Copy, Default)]
struct StreamNeeds {
    infrared: bool,
    color: bool,
    depth: bool,
    body_index: bool,
    body: bool,
}

impl StreamNeeds {
    fn from_subscribers(subscribers: &[Arc<Subscriber>]) -> Self {
        let count =
            |kind| subscribers.iter().filter(|s| s.has_capability(kind)).count();

        Self {
            infrared: count(StreamKind::Infrared) > 0,
            color: count(StreamKind::Color) > 0,
            depth: count(StreamKind::Depth) > 0,
            body_index: count(StreamKind::BodyIndex) > 0,
            body: count(StreamKind::Body) > 0,
        }
    }

    fn needs(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Infrared => self.infrared,
            StreamKind::Color => self.color,
            StreamKind::Depth => self.depth,
            StreamKind::BodyIndex => self.body_index,
            StreamKind::Body => self.body,
        }
    }
}

/// The single active device binding
///
/// Owns the device handle, the five reader sets, the advisory channel, and a
/// session colorizer built from the configured bounds. One session exists
/// per process lifetime of the device; see the module docs for the state
/// machine.
pub struct DeviceSession {
    device: Box<dyn SensorDevice>,
    registry: Arc<SubscriberRegistry>,
    config: SessionConfig,
    phase: SessionPhase,
    needs: StreamNeeds,
    // Snapshot taken at start(); restart() reuses it without re-enumerating
    // the registry.
    subscribers: Vec<Arc<Subscriber>>,
    reader_sets: HashMap<StreamKind, StreamReaderSet>,
    status_tx: broadcast::Sender<StatusMessage>,
    mapper: Option<Arc<dyn CoordinateMapper>>,
    colorizer: Arc<RangeColorizer>,
    paused: bool,
}

impl DeviceSession {
    /// Create a session over a device and a subscriber set
    ///
    /// Nothing touches the hardware until [`start`](Self::start).
    pub fn new(
        device: Box<dyn SensorDevice>,
        registry: Arc<SubscriberRegistry>,
        config: SessionConfig,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(config.status_capacity);
        let colorizer = Arc::new(RangeColorizer::new(
            config.min_depth,
            config.max_depth,
            config.depth_treatment,
        ));

        Self {
            device,
            registry,
            config,
            phase: SessionPhase::Uninitialized,
            needs: StreamNeeds::default(),
            subscribers: Vec::new(),
            reader_sets: HashMap::new(),
            status_tx,
            mapper: None,
            colorizer,
            paused: false,
        }
    }

    /// Current lifecycle state
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a receiver on the lifecycle advisory channel
    pub fn status_subscribe(&self) -> broadcast::Receiver<StatusMessage> {
        self.status_tx.subscribe()
    }

    /// The session colorizer, shared with colorization consumers
    pub fn colorizer(&self) -> Arc<RangeColorizer> {
        Arc::clone(&self.colorizer)
    }

    /// The device's coordinate mapper, available once started
    pub fn mapper(&self) -> Option<Arc<dyn CoordinateMapper>> {
        self.mapper.clone()
    }

    /// Whether the session enabled the given stream type at start
    pub fn uses(&self, kind: StreamKind) -> bool {
        self.needs.needs(kind)
    }

    /// The device's minimum reliable depth, 0 while the device is closed
    pub fn min_depth(&self) -> u16 {
        if self.device.is_open() {
            self.device.reliable_depth_range().0
        } else {
            0
        }
    }

    /// The device's maximum reliable depth, 0 while the device is closed
    pub fn max_depth(&self) -> u16 {
        if self.device.is_open() {
            self.device.reliable_depth_range().1
        } else {
            0
        }
    }

    /// Start the session
    ///
    /// Legal only from `Uninitialized`; a second call is a caller bug and
    /// fails with [`Error::InvalidLifecycleTransition`]. Computes the needed
    /// stream types from the subscriber capability counts, opens the device,
    /// starts a reader set per needed stream, and resolves the coordinate
    /// mapper. On failure the device and readers are released again and the
    /// session stays `Uninitialized`.
    pub async fn start(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Uninitialized {
            return Err(Error::InvalidLifecycleTransition {
                from: self.phase,
                operation: "start",
            });
        }

        self.advise(
            "Please wait while the sensor initializes...",
            DeviceState::Initializing,
        );

        self.subscribers = self.registry.subscribers();
        self.needs = StreamNeeds::from_subscribers(&self.subscribers);
        tracing::info!(
            infrared = self.needs.infrared,
            color = self.needs.color,
            depth = self.needs.depth,
            body_index = self.needs.body_index,
            body = self.needs.body,
            subscribers = self.subscribers.len(),
            "stream needs computed"
        );

        if let Err(e) = self.open_device_and_readers().await {
            self.release_device().await;
            return Err(e);
        }

        self.mapper = Some(self.device.coordinate_mapper());

        self.advise("The sensor is now running.", DeviceState::Running);
        self.phase = SessionPhase::Started;
        Ok(())
    }

    /// Tear the streams down and bring them back up
    ///
    /// Legal only from `Started`. Clears the global paused flag, then stops
    /// and re-opens the device and reader sets, emitting `Restarting` rather
    /// than the shutdown advisories so downstream consumers know resources
    /// come back. The needed-stream flags and subscriber set captured at
    /// [`start`](Self::start) are reused as-is.
    pub async fn restart(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Started {
            return Err(Error::InvalidLifecycleTransition {
                from: self.phase,
                operation: "restart",
            });
        }

        self.paused = false;

        self.stop_device(true).await;

        if let Err(e) = self.open_device_and_readers().await {
            self.release_device().await;
            return Err(e);
        }

        self.mapper = Some(self.device.coordinate_mapper());
        tracing::info!("session restarted");
        Ok(())
    }

    /// Shut the session down for good
    ///
    /// Legal only from `Started`. Stops every reader set, releases the
    /// device, and transitions to `Shutdown`; the session cannot be started
    /// again afterwards.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Started {
            return Err(Error::InvalidLifecycleTransition {
                from: self.phase,
                operation: "shutdown",
            });
        }

        self.stop_device(false).await;
        self.phase = SessionPhase::Shutdown;
        Ok(())
    }

    /// Pause one subscriber's readers
    ///
    /// `kind = None` pauses the subscriber's reader for every stream type.
    /// Stream types the subscriber has no reader for are silently skipped.
    pub fn pause(&mut self, id: SubscriberId, kind: Option<StreamKind>) -> Result<()> {
        self.set_subscriber_paused(id, kind, true)
    }

    /// Resume one subscriber's readers
    ///
    /// `kind = None` resumes the subscriber's reader for every stream type.
    /// Stream types the subscriber has no reader for are silently skipped.
    pub fn resume(&mut self, id: SubscriberId, kind: Option<StreamKind>) -> Result<()> {
        self.set_subscriber_paused(id, kind, false)
    }

    fn set_subscriber_paused(
        &mut self,
        id: SubscriberId,
        kind: Option<StreamKind>,
        paused: bool,
    ) -> Result<()> {
        if self.phase != SessionPhase::Started {
            return Err(Error::InvalidLifecycleTransition {
                from: self.phase,
                operation: if paused { "pause" } else { "resume" },
            });
        }

        match kind {
            None => {
                for set in self.reader_sets.values() {
                    set.set_paused(id, paused);
                }
            }
            Some(kind) => {
                if let Some(set) = self.reader_sets.get(&kind) {
                    set.set_paused(id, paused);
                }
            }
        }

        tracing::debug!(subscriber = %id, kind = ?kind, paused, "subscriber pause state changed");
        Ok(())
    }

    /// Whether the whole session is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume every reader of every active stream
    ///
    /// A no-op when the flag already matches. Cleared by
    /// [`restart`](Self::restart).
    pub fn set_paused(&mut self, paused: bool) -> Result<()> {
        if self.phase != SessionPhase::Started {
            return Err(Error::InvalidLifecycleTransition {
                from: self.phase,
                operation: if paused { "pause" } else { "resume" },
            });
        }

        if self.paused == paused {
            return Ok(());
        }

        for set in self.reader_sets.values() {
            set.set_all_paused(paused);
        }

        self.paused = paused;
        tracing::info!(paused, "session pause state changed");
        Ok(())
    }

    /// Whether one subscriber's reader for a stream is paused
    pub fn reader_paused(&self, kind: StreamKind, id: SubscriberId) -> Option<bool> {
        self.reader_sets.get(&kind).and_then(|set| set.is_paused(id))
    }

    /// Delivery counters for one subscriber's reader
    pub fn reader_stats(&self, kind: StreamKind, id: SubscriberId) -> Option<ReaderStatsSnapshot> {
        self.reader_sets.get(&kind).and_then(|set| set.stats(id))
    }

    // Opens the device and one reader set per needed stream.
    async fn open_device_and_readers(&mut self) -> Result<()> {
        self.device.open()?;

        for kind in StreamKind::ALL {
            if !self.needs.needs(kind) {
                continue;
            }

            let source = self.device.source(kind)?;
            let mut set = StreamReaderSet::new(kind);
            set.open_for(&source, &self.subscribers)?;

            tracing::info!(kind = %kind, readers = set.len(), "stream started");
            self.reader_sets.insert(kind, set);
        }

        Ok(())
    }

    // Emits the stop advisories, pauses and awaits every reader, then closes
    // the device. Readers are awaited before the close so no callback can
    // touch a released handle.
    async fn stop_device(&mut self, restarting: bool) {
        if restarting {
            self.advise("The sensor is now restarting.", DeviceState::Restarting);
        } else {
            self.advise("The sensor is now shutting down.", DeviceState::ShuttingDown);
        }

        self.release_device().await;

        if !restarting {
            self.advise("The sensor is now shut down.", DeviceState::Shutdown);
        }
    }

    // Unconditional teardown shared by stop and failure unwinding.
    async fn release_device(&mut self) {
        for kind in StreamKind::ALL {
            if let Some(mut set) = self.reader_sets.remove(&kind) {
                set.close_all().await;
            }
        }

        self.mapper = None;
        self.device.close();
    }

    fn advise(&self, text: &str, state: DeviceState) {
        tracing::info!(state = %state, "{}", text);
        let _ = self.status_tx.send(StatusMessage::new(text, state));
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("phase", &self.phase)
            .field("needs", &self.needs)
            .field("paused", &self.paused)
            .field("active_streams", &self.reader_sets.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::device::synthetic::{SyntheticConfig, SyntheticDevice, SyntheticHandle};
    use crate::subscriber::Subscriber;

    use super::*;

    fn small_device() -> (SyntheticDevice, SyntheticHandle) {
        let device = SyntheticDevice::with_config(
            SyntheticConfig::default().depth_size(2, 1).color_size(2, 1),
        );
        let handle = device.handle();
        (device, handle)
    }

    fn counting_subscriber(
        registry: &SubscriberRegistry,
        name: &str,
        kinds: &[StreamKind],
    ) -> (SubscriberId, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let mut builder = Subscriber::builder(registry.allocate_id(), name);
        for kind in kinds {
            let counter = Arc::clone(&count);
            builder = builder.on_frame(*kind, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        let sub = builder.build();
        let id = sub.id();
        registry.insert(sub);
        (id, count)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let (device, _handle) = small_device();
        let registry = Arc::new(SubscriberRegistry::new());
        counting_subscriber(&registry, "viewer", &[StreamKind::Depth]);

        let mut session = DeviceSession::new(
            Box::new(device),
            Arc::clone(&registry),
            SessionConfig::default(),
        );

        session.start().await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Started);

        let result = session.start().await;
        assert!(matches!(
            result,
            Err(Error::InvalidLifecycleTransition {
                from: SessionPhase::Started,
                operation: "start",
            })
        ));

        session.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_no_restart_after_shutdown() {
        let (device, _handle) = small_device();
        let registry = Arc::new(SubscriberRegistry::new());
        counting_subscriber(&registry, "viewer", &[StreamKind::Depth]);

        let mut session = DeviceSession::new(
            Box::new(device),
            Arc::clone(&registry),
            SessionConfig::default(),
        );

        session.start().await.unwrap();
        session.shutdown().await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Shutdown);

        // No implicit re-initialization path: a fresh session is required.
        assert!(matches!(
            session.start().await,
            Err(Error::InvalidLifecycleTransition { .. })
        ));
        assert!(matches!(
            session.restart().await,
            Err(Error::InvalidLifecycleTransition { .. })
        ));
        assert!(matches!(
            session.shutdown().await,
            Err(Error::InvalidLifecycleTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_needed_streams_follow_capabilities() {
        let (device, handle) = small_device();
        let registry = Arc::new(SubscriberRegistry::new());
        let (_, depth_count) =
            counting_subscriber(&registry, "depth_viewer", &[StreamKind::Depth]);

        let mut session = DeviceSession::new(
            Box::new(device),
            Arc::clone(&registry),
            SessionConfig::default(),
        );
        session.start().await.unwrap();

        assert!(session.uses(StreamKind::Depth));
        assert!(!session.uses(StreamKind::Color));
        assert!(session.mapper().is_some());
        assert_eq!(session.min_depth(), 500);
        assert_eq!(session.max_depth(), 4500);

        settle().await;
        // Nothing listens to color, so a color push reaches no readers.
        assert_eq!(handle.push_color(&[0u8; 8]), 0);
        assert_eq!(handle.push_depth(&[600, 700]), 1);
        settle().await;
        assert_eq!(depth_count.load(Ordering::SeqCst), 1);

        session.shutdown().await.unwrap();
        assert_eq!(session.min_depth(), 0);
    }

    #[tokio::test]
    async fn test_advisory_sequence() {
        let (device, _handle) = small_device();
        let registry = Arc::new(SubscriberRegistry::new());
        counting_subscriber(&registry, "viewer", &[StreamKind::Depth]);

        let mut session = DeviceSession::new(
            Box::new(device),
            Arc::clone(&registry),
            SessionConfig::default(),
        );
        let mut status_rx = session.status_subscribe();

        session.start().await.unwrap();
        session.restart().await.unwrap();
        session.shutdown().await.unwrap();

        let states: Vec<DeviceState> = std::iter::from_fn(|| status_rx.try_recv().ok())
            .map(|m| m.state)
            .collect();

        assert_eq!(
            states,
            vec![
                DeviceState::Initializing,
                DeviceState::Running,
                DeviceState::Restarting,
                DeviceState::ShuttingDown,
                DeviceState::Shutdown,
            ]
        );
    }

    #[tokio::test]
    async fn test_restart_keeps_stale_needs() {
        let (device, handle) = small_device();
        let registry = Arc::new(SubscriberRegistry::new());
        let (_, depth_count) =
            counting_subscriber(&registry, "depth_viewer", &[StreamKind::Depth]);

        let mut session = DeviceSession::new(
            Box::new(device),
            Arc::clone(&registry),
            SessionConfig::default(),
        );
        session.start().await.unwrap();

        // Subscribers registered after start() are not picked up by restart(),
        // whether they need a new stream type or an already-running one.
        let (_, late_color_count) =
            counting_subscriber(&registry, "late_color", &[StreamKind::Color]);
        let (_, late_depth_count) =
            counting_subscriber(&registry, "late_depth", &[StreamKind::Depth]);

        session.restart().await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Started);
        assert!(!session.uses(StreamKind::Color));

        settle().await;
        assert_eq!(handle.push_color(&[0u8; 8]), 0);
        assert_eq!(handle.push_depth(&[600, 700]), 1);
        settle().await;

        assert_eq!(late_color_count.load(Ordering::SeqCst), 0);
        assert_eq!(late_depth_count.load(Ordering::SeqCst), 0);
        assert!(depth_count.load(Ordering::SeqCst) > 0);

        session.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_isolation_across_both_axes() {
        let (device, handle) = small_device();
        let registry = Arc::new(SubscriberRegistry::new());
        let (a, a_count) = counting_subscriber(
            &registry,
            "sub_a",
            &[StreamKind::Depth, StreamKind::Color],
        );
        let (_b, b_count) = counting_subscriber(&registry, "sub_b", &[StreamKind::Depth]);

        let mut session = DeviceSession::new(
            Box::new(device),
            Arc::clone(&registry),
            SessionConfig::default(),
        );
        session.start().await.unwrap();
        settle().await;

        // Pause only A's depth reader.
        session.pause(a, Some(StreamKind::Depth)).unwrap();
        assert_eq!(session.reader_paused(StreamKind::Depth, a), Some(true));
        assert_eq!(session.reader_paused(StreamKind::Color, a), Some(false));

        handle.push_depth(&[600, 700]);
        handle.push_color(&[0u8; 8]);
        settle().await;

        // B's depth reader and A's color reader are unaffected.
        assert_eq!(b_count.load(Ordering::SeqCst), 1);
        assert_eq!(a_count.load(Ordering::SeqCst), 1);

        session.resume(a, None).unwrap();
        handle.push_depth(&[600, 700]);
        settle().await;
        assert_eq!(a_count.load(Ordering::SeqCst), 2);
        assert_eq!(b_count.load(Ordering::SeqCst), 2);

        session.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_for_missing_reader_is_a_no_op() {
        let (device, _handle) = small_device();
        let registry = Arc::new(SubscriberRegistry::new());
        let (id, _) = counting_subscriber(&registry, "depth_only", &[StreamKind::Depth]);

        let mut session = DeviceSession::new(
            Box::new(device),
            Arc::clone(&registry),
            SessionConfig::default(),
        );
        session.start().await.unwrap();

        // No depth reader for an unknown id, no color stream at all: both fine.
        session.pause(registry.allocate_id(), None).unwrap();
        session.pause(id, Some(StreamKind::Color)).unwrap();

        session.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_requires_started() {
        let (device, _handle) = small_device();
        let registry = Arc::new(SubscriberRegistry::new());
        let (id, _) = counting_subscriber(&registry, "viewer", &[StreamKind::Depth]);

        let mut session = DeviceSession::new(
            Box::new(device),
            Arc::clone(&registry),
            SessionConfig::default(),
        );

        assert!(matches!(
            session.pause(id, None),
            Err(Error::InvalidLifecycleTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_global_pause_and_restart_clears_it() {
        let (device, handle) = small_device();
        let registry = Arc::new(SubscriberRegistry::new());
        let (_, count) = counting_subscriber(&registry, "viewer", &[StreamKind::Depth]);

        let mut session = DeviceSession::new(
            Box::new(device),
            Arc::clone(&registry),
            SessionConfig::default(),
        );
        session.start().await.unwrap();
        settle().await;

        session.set_paused(true).unwrap();
        assert!(session.is_paused());
        handle.push_depth(&[600, 700]);
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        session.restart().await.unwrap();
        assert!(!session.is_paused());
        settle().await;
        handle.push_depth(&[600, 700]);
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        session.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_session_colorizer_uses_configured_bounds() {
        let (device, _handle) = small_device();
        let registry = Arc::new(SubscriberRegistry::new());

        let session = DeviceSession::new(
            Box::new(device),
            Arc::clone(&registry),
            SessionConfig::default().depth_range(500, 4000),
        );

        let colorizer = session.colorizer();
        assert_eq!(colorizer.min_depth(), 500);
        assert_eq!(colorizer.max_depth(), 4000);
    }
}
