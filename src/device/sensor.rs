//! The device seam
//!
//! The session drives the physical sensor through this trait, so the
//! lifecycle engine and fan-out never depend on a particular SDK. A device
//! exposes one frame source per stream type it supports; each source is a
//! broadcast channel the reader sets subscribe to.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::Result;
use crate::mapping::CoordinateMapper;
use crate::stream::{FrameDescription, SensorFrame, StreamKind};

/// The publishing side of one stream
///
/// Handed out by the device; cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct FrameSource {
    kind: StreamKind,
    description: FrameDescription,
    body_capacity: Option<usize>,
    tx: broadcast::Sender<SensorFrame>,
}

impl FrameSource {
    /// Create a source with its own broadcast channel
    pub fn new(
        kind: StreamKind,
        description: FrameDescription,
        body_capacity: Option<usize>,
        channel_capacity: usize,
    ) -> Self {
        let (tx, _) = broadcast::channel(channel_capacity);

        Self {
            kind,
            description,
            body_capacity,
            tx,
        }
    }

    /// The stream type this source publishes
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Resolution and pixel layout of this stream
    pub fn description(&self) -> FrameDescription {
        self.description
    }

    /// Tracked-body capacity, for body sources
    pub fn body_capacity(&self) -> Option<usize> {
        self.body_capacity
    }

    /// Open a receiver on this stream's channel
    pub fn subscribe(&self) -> broadcast::Receiver<SensorFrame> {
        self.tx.subscribe()
    }

    /// Publish a frame to every open receiver
    ///
    /// Returns the number of receivers that got the frame; 0 when nobody is
    /// listening.
    pub fn publish(&self, frame: SensorFrame) -> usize {
        self.tx.send(frame).unwrap_or(0)
    }
}

/// A physical (or synthetic) sensor device
///
/// The session owns exactly one device and is the only caller of `open` and
/// `close`. Implementations must make `close` safe to call on a device that
/// never opened, and must keep frame sources quiet while closed.
pub trait SensorDevice: Send {
    /// Acquire the hardware
    fn open(&mut self) -> Result<()>;

    /// Release the hardware
    fn close(&mut self);

    /// Whether the device is currently open
    fn is_open(&self) -> bool;

    /// The source for one stream type
    ///
    /// Only valid while the device is open.
    fn source(&self, kind: StreamKind) -> Result<FrameSource>;

    /// Number of tracked-body slots per body frame
    fn body_capacity(&self) -> usize;

    /// Reliable depth range in millimeters, `(min, max)`
    fn reliable_depth_range(&self) -> (u16, u16);

    /// The calibration-backed coordinate mapper
    fn coordinate_mapper(&self) -> Arc<dyn CoordinateMapper>;
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn test_publish_counts_receivers() {
        let source = FrameSource::new(
            StreamKind::Infrared,
            FrameDescription::new(2, 1, 2),
            None,
            4,
        );

        let frame = SensorFrame::samples(
            StreamKind::Infrared,
            0,
            source.description(),
            Bytes::from_static(&[0, 0, 0, 0]),
        );

        // Nobody listening yet.
        assert_eq!(source.publish(frame.clone()), 0);

        let mut first = source.subscribe();
        let mut second = source.subscribe();
        assert_eq!(source.publish(frame), 2);

        let received = tokio_test::block_on(first.recv()).unwrap();
        assert_eq!(received.kind, StreamKind::Infrared);
        assert!(tokio_test::block_on(second.recv()).is_ok());
    }
}
