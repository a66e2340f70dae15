//! Device binding: the sensor seam, session lifecycle, and advisories
//!
//! One [`DeviceSession`] owns the single active device and orchestrates the
//! per-stream reader sets over it. The device itself sits behind the
//! [`SensorDevice`] trait; [`SyntheticDevice`] is the in-process
//! implementation used by tests and demos.

pub mod config;
pub mod sensor;
pub mod session;
pub mod status;
pub mod synthetic;

pub use config::SessionConfig;
pub use sensor::{FrameSource, SensorDevice};
pub use session::{DeviceSession, SessionPhase};
pub use status::{DeviceState, StatusMessage};
pub use synthetic::{SyntheticConfig, SyntheticDevice, SyntheticHandle};
