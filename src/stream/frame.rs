//! Frame types shared across the stream fan-out
//!
//! This module defines the stream identifiers, the per-stream frame metadata,
//! and the frames that are broadcast to readers.

use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::stream::body::Body;

/// One of the device's independent hardware data channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// 16-bit infrared intensity samples
    Infrared,
    /// 32-bit BGRA color pixels
    Color,
    /// 16-bit range samples in millimeters
    Depth,
    /// 8-bit per-pixel body index labels
    BodyIndex,
    /// Tracked skeletal body data
    Body,
}

impl StreamKind {
    /// Every stream kind, in a fixed order
    pub const ALL: [StreamKind; 5] = [
        StreamKind::Infrared,
        StreamKind::Color,
        StreamKind::Depth,
        StreamKind::BodyIndex,
        StreamKind::Body,
    ];

    /// Stable lowercase name, used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Infrared => "infrared",
            StreamKind::Color => "color",
            StreamKind::Depth => "depth",
            StreamKind::BodyIndex => "body-index",
            StreamKind::Body => "body",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution and pixel-format metadata reported by a stream when opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameDescription {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Bytes per pixel in the raw payload
    pub bytes_per_pixel: u32,
}

impl FrameDescription {
    /// Create a new frame description
    pub fn new(width: u32, height: u32, bytes_per_pixel: u32) -> Self {
        Self {
            width,
            height,
            bytes_per_pixel,
        }
    }

    /// Number of pixels per frame
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw payload length in bytes
    pub fn byte_len(&self) -> usize {
        self.pixel_count() * self.bytes_per_pixel as usize
    }
}

/// Raw per-frame data
///
/// Pixel streams carry their samples as `Bytes` (depth and infrared:
/// little-endian u16, color: BGRA, body-index: one label byte per pixel).
/// Body streams carry the tracked-body records directly. Cloning either
/// variant is reference counted, not copied.
#[derive(Debug, Clone)]
pub enum FramePayload {
    /// Raw pixel samples
    Samples(Bytes),
    /// Tracked body records
    Bodies(Arc<[Body]>),
}

/// A single frame broadcast to the readers of one stream
///
/// Designed to be cheap to clone: the payload is reference counted, so every
/// reader of a stream shares the same allocation.
#[derive(Debug, Clone)]
pub struct SensorFrame {
    /// Which stream this frame belongs to
    pub kind: StreamKind,
    /// Device-relative capture time in microseconds
    pub timestamp_us: u64,
    /// Resolution and pixel layout of the payload
    pub description: FrameDescription,
    /// The frame data
    pub payload: FramePayload,
}

impl SensorFrame {
    /// Create a pixel-stream frame
    pub fn samples(
        kind: StreamKind,
        timestamp_us: u64,
        description: FrameDescription,
        data: Bytes,
    ) -> Self {
        Self {
            kind,
            timestamp_us,
            description,
            payload: FramePayload::Samples(data),
        }
    }

    /// Create a body-stream frame
    pub fn bodies(timestamp_us: u64, bodies: Arc<[Body]>) -> Self {
        Self {
            kind: StreamKind::Body,
            timestamp_us,
            description: FrameDescription::default(),
            payload: FramePayload::Bodies(bodies),
        }
    }
}

/// A consume-once reference to the latest frame delivered to a reader
///
/// The reader's delivery task places each frame into the slot before invoking
/// the subscriber callback; replacing an unconsumed frame models a frame that
/// expired before anyone looked at it. `acquire` takes the frame out, so a
/// second acquisition observes "no data" rather than stale samples.
#[derive(Debug, Clone)]
pub struct FrameRef {
    slot: Arc<Mutex<Option<SensorFrame>>>,
}

impl FrameRef {
    pub(crate) fn from_slot(slot: Arc<Mutex<Option<SensorFrame>>>) -> Self {
        Self { slot }
    }

    /// Wrap a frame that is immediately available
    ///
    /// Useful for driving the frame processors outside a reader, e.g. from
    /// recorded data or in tests.
    pub fn ready(frame: SensorFrame) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(frame))),
        }
    }

    /// An empty reference: every acquisition reports no data
    pub fn empty() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Take the frame, if one is still available
    pub fn acquire(&self) -> Option<SensorFrame> {
        self.slot.lock().unwrap().take()
    }
}
