//! Stream fan-out: frames, readers, and per-stream reader sets
//!
//! Every stream type the device exposes is an independent hardware channel.
//! The device publishes each stream on its own broadcast channel; a
//! [`StreamReaderSet`] fans that channel out to one reader per subscriber:
//!
//! ```text
//!        FrameSource (device)
//!      broadcast::Sender<SensorFrame>
//!                 │
//!      ┌──────────┼──────────┐
//!      ▼          ▼          ▼
//!  [reader]   [reader]   [reader]      one task per
//!  sub #0     sub #1     sub #2        (stream, subscriber)
//!      │          │          │
//!   callback   callback   callback     serialized per reader
//! ```
//!
//! `bytes::Bytes` payloads are reference counted, so fan-out clones share
//! one allocation.

pub mod body;
pub mod frame;
pub(crate) mod reader;
pub mod reader_set;

pub use body::{Body, HandState, Joint, JointKind, TrackingState};
pub use frame::{FrameDescription, FramePayload, FrameRef, SensorFrame, StreamKind};
pub use reader_set::StreamReaderSet;
