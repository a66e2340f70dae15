//! Multi-stream sensor fan-out and colorization
//!
//! Ingests the five data channels of a single active depth sensor
//! (infrared, color, depth, body-index, body tracking), fans each stream out
//! to any number of independent subscribers, and converts raw 16-bit samples
//! into displayable imagery through precomputed lookup tables.
//!
//! # Architecture
//!
//! ```text
//!   SubscriberRegistry ──────► DeviceSession ────► advisory channel
//!   (capability sets)          (lifecycle FSM)     (Initializing .. Shutdown)
//!                                    │
//!                   one per needed stream type
//!                                    ▼
//!                             StreamReaderSet ◄──── SensorDevice
//!                         (reader per subscriber)   (FrameSource per stream)
//!                                    │
//!                          subscriber callback
//!                                    ▼
//!                    process_*_frame ──► RangeColorizer ──► OutputImage
//! ```
//!
//! Each (stream type, subscriber) pair gets its own delivery task, so one
//! slow consumer never stalls another; frame payloads are `bytes::Bytes`,
//! shared across the fan-out by reference count.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use depthcam_rs::color::{process_depth_frame, DepthParams, SampleBuffer};
//! use depthcam_rs::device::{DeviceSession, SessionConfig, SyntheticDevice};
//! use depthcam_rs::subscriber::{Subscriber, SubscriberRegistry};
//!
//! # async fn run() -> depthcam_rs::Result<()> {
//! let registry = Arc::new(SubscriberRegistry::new());
//! let device = SyntheticDevice::new();
//!
//! let colorizer = Arc::new(depthcam_rs::color::RangeColorizer::default());
//! let viewer_colorizer = Arc::clone(&colorizer);
//! // The sample buffer belongs to this subscriber and is reused per frame.
//! let samples = std::sync::Mutex::new(SampleBuffer::new());
//! registry.insert(
//!     Subscriber::builder(registry.allocate_id(), "depth_viewer")
//!         .on_depth(move |frame| {
//!             let mut samples = samples.lock().unwrap();
//!             if let Some(image) = process_depth_frame(
//!                 &frame,
//!                 &mut samples,
//!                 &viewer_colorizer,
//!                 DepthParams::default(),
//!             ) {
//!                 println!("{}x{} image", image.width(), image.height());
//!             }
//!         })
//!         .build(),
//! );
//!
//! let mut session =
//!     DeviceSession::new(Box::new(device), registry, SessionConfig::default());
//! session.start().await?;
//! // ... frames flow until ...
//! session.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod device;
pub mod error;
pub mod mapping;
pub mod observation;
pub mod stats;
pub mod stream;
pub mod subscriber;

pub use color::{DepthParams, DepthTreatment, OutputImage, RangeColorizer, SampleBuffer};
pub use device::{DeviceSession, SessionConfig, SessionPhase, StatusMessage, SyntheticDevice};
pub use error::{Error, Result};
pub use stream::{FrameDescription, FrameRef, SensorFrame, StreamKind};
pub use subscriber::{Subscriber, SubscriberId, SubscriberRegistry};
