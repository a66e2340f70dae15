//! Synthetic in-process device
//!
//! A deterministic [`SensorDevice`] used by tests and demos: the caller
//! injects frames through a [`SyntheticHandle`] and they flow through the
//! same fan-out as hardware frames would. Timestamps advance by one frame
//! interval (33.3 ms) per injected frame.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::mapping::{CoordinateMapper, PinholeMapper};
use crate::stream::{Body, FrameDescription, SensorFrame, StreamKind};

use super::sensor::{FrameSource, SensorDevice};

const FRAME_INTERVAL_US: u64 = 33_333;

/// Configuration for a [`SyntheticDevice`]
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Depth stream resolution
    pub depth_size: (u32, u32),
    /// Infrared stream resolution
    pub infrared_size: (u32, u32),
    /// Color stream resolution
    pub color_size: (u32, u32),
    /// Body-index stream resolution
    pub body_index_size: (u32, u32),
    /// Tracked-body slots per body frame
    pub body_capacity: usize,
    /// Reliable depth range in millimeters
    pub reliable_depth: (u16, u16),
    /// Broadcast capacity of each stream channel
    pub channel_capacity: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            depth_size: (512, 424),
            infrared_size: (512, 424),
            color_size: (1920, 1080),
            body_index_size: (512, 424),
            body_capacity: 6,
            reliable_depth: (500, 4500),
            channel_capacity: 16,
        }
    }
}

impl SyntheticConfig {
    /// Set the depth and infrared resolution
    pub fn depth_size(mut self, width: u32, height: u32) -> Self {
        self.depth_size = (width, height);
        self.infrared_size = (width, height);
        self.body_index_size = (width, height);
        self
    }

    /// Set the color resolution
    pub fn color_size(mut self, width: u32, height: u32) -> Self {
        self.color_size = (width, height);
        self
    }

    /// Set the tracked-body capacity
    pub fn body_capacity(mut self, capacity: usize) -> Self {
        self.body_capacity = capacity;
        self
    }

    /// Set the reliable depth range
    pub fn reliable_depth(mut self, min: u16, max: u16) -> Self {
        self.reliable_depth = (min, max);
        self
    }

    /// Set the broadcast capacity of each stream channel
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

#[derive(Debug)]
struct Inner {
    config: SyntheticConfig,
    open: AtomicBool,
    sources: HashMap<StreamKind, FrameSource>,
    clock_us: AtomicU64,
    mapper: Arc<PinholeMapper>,
}

impl Inner {
    fn next_timestamp(&self) -> u64 {
        self.clock_us.fetch_add(FRAME_INTERVAL_US, Ordering::Relaxed)
    }

    fn publish(&self, kind: StreamKind, frame: SensorFrame) -> usize {
        if !self.open.load(Ordering::Acquire) {
            tracing::debug!(kind = %kind, "frame dropped: device is closed");
            return 0;
        }

        // Sources exist for every kind; the map is built at construction.
        match self.sources.get(&kind) {
            Some(source) => source.publish(frame),
            None => 0,
        }
    }
}

/// In-process device fed by a [`SyntheticHandle`]
#[derive(Debug)]
pub struct SyntheticDevice {
    inner: Arc<Inner>,
}

impl SyntheticDevice {
    /// Create a device with the default configuration
    pub fn new() -> Self {
        Self::with_config(SyntheticConfig::default())
    }

    /// Create a device with a custom configuration
    pub fn with_config(config: SyntheticConfig) -> Self {
        let mut sources = HashMap::new();

        let pixel_streams = [
            (StreamKind::Depth, config.depth_size, 2),
            (StreamKind::Infrared, config.infrared_size, 2),
            (StreamKind::Color, config.color_size, 4),
            (StreamKind::BodyIndex, config.body_index_size, 1),
        ];
        for (kind, (width, height), bytes_per_pixel) in pixel_streams {
            sources.insert(
                kind,
                FrameSource::new(
                    kind,
                    FrameDescription::new(width, height, bytes_per_pixel),
                    None,
                    config.channel_capacity,
                ),
            );
        }
        sources.insert(
            StreamKind::Body,
            FrameSource::new(
                StreamKind::Body,
                FrameDescription::default(),
                Some(config.body_capacity),
                config.channel_capacity,
            ),
        );

        let mapper = Arc::new(PinholeMapper::new(
            config.depth_size,
            config.color_size,
            365.0,
        ));

        Self {
            inner: Arc::new(Inner {
                config,
                open: AtomicBool::new(false),
                sources,
                clock_us: AtomicU64::new(0),
                mapper,
            }),
        }
    }

    /// A handle for injecting frames into this device
    pub fn handle(&self) -> SyntheticHandle {
        SyntheticHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for SyntheticDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorDevice for SyntheticDevice {
    fn open(&mut self) -> Result<()> {
        self.inner.open.store(true, Ordering::Release);
        tracing::debug!("synthetic device opened");
        Ok(())
    }

    fn close(&mut self) {
        self.inner.open.store(false, Ordering::Release);
        tracing::debug!("synthetic device closed");
    }

    fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    fn source(&self, kind: StreamKind) -> Result<FrameSource> {
        if !self.is_open() {
            return Err(Error::SourceUnavailable(kind));
        }

        self.inner
            .sources
            .get(&kind)
            .cloned()
            .ok_or(Error::SourceUnavailable(kind))
    }

    fn body_capacity(&self) -> usize {
        self.inner.config.body_capacity
    }

    fn reliable_depth_range(&self) -> (u16, u16) {
        self.inner.config.reliable_depth
    }

    fn coordinate_mapper(&self) -> Arc<dyn CoordinateMapper> {
        Arc::clone(&self.inner.mapper) as Arc<dyn CoordinateMapper>
    }
}

/// Frame-injection handle for a [`SyntheticDevice`]
///
/// Cloneable; pushes are dropped while the device is closed. Each push
/// returns the number of readers that received the frame.
#[derive(Debug, Clone)]
pub struct SyntheticHandle {
    inner: Arc<Inner>,
}

impl SyntheticHandle {
    fn samples_to_bytes(samples: &[u16]) -> Bytes {
        let mut data = BytesMut::with_capacity(samples.len() * 2);
        for sample in samples {
            data.put_u16_le(*sample);
        }
        data.freeze()
    }

    /// Inject a depth frame
    pub fn push_depth(&self, samples: &[u16]) -> usize {
        let source = &self.inner.sources[&StreamKind::Depth];
        let frame = SensorFrame::samples(
            StreamKind::Depth,
            self.inner.next_timestamp(),
            source.description(),
            Self::samples_to_bytes(samples),
        );
        self.inner.publish(StreamKind::Depth, frame)
    }

    /// Inject an infrared frame
    pub fn push_infrared(&self, samples: &[u16]) -> usize {
        let source = &self.inner.sources[&StreamKind::Infrared];
        let frame = SensorFrame::samples(
            StreamKind::Infrared,
            self.inner.next_timestamp(),
            source.description(),
            Self::samples_to_bytes(samples),
        );
        self.inner.publish(StreamKind::Infrared, frame)
    }

    /// Inject a color frame of BGRA pixels
    pub fn push_color(&self, pixels: &[u8]) -> usize {
        let source = &self.inner.sources[&StreamKind::Color];
        let frame = SensorFrame::samples(
            StreamKind::Color,
            self.inner.next_timestamp(),
            source.description(),
            Bytes::copy_from_slice(pixels),
        );
        self.inner.publish(StreamKind::Color, frame)
    }

    /// Inject a body-index frame of label bytes
    pub fn push_body_index(&self, labels: &[u8]) -> usize {
        let source = &self.inner.sources[&StreamKind::BodyIndex];
        let frame = SensorFrame::samples(
            StreamKind::BodyIndex,
            self.inner.next_timestamp(),
            source.description(),
            Bytes::copy_from_slice(labels),
        );
        self.inner.publish(StreamKind::BodyIndex, frame)
    }

    /// Inject a body frame
    ///
    /// Pads or truncates nothing: callers should supply exactly
    /// `body_capacity` records, matching what hardware delivers.
    pub fn push_bodies(&self, bodies: Vec<Body>) -> usize {
        let frame = SensorFrame::bodies(self.inner.next_timestamp(), bodies.into());
        self.inner.publish(StreamKind::Body, frame)
    }
}
