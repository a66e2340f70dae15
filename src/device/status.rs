//! Lifecycle advisory messages
//!
//! The session publishes one-way notifications as it moves through its
//! lifecycle. They exist for UI and logging collaborators; nothing in the
//! core reads them back or acts on them.

/// State tag carried by an advisory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// The device is being opened
    Initializing,
    /// The device is open and streams are flowing
    Running,
    /// The device is being released for good
    ShuttingDown,
    /// The device has been released
    Shutdown,
    /// Streams are being torn down ahead of a reacquire
    Restarting,
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceState::Initializing => "initializing",
            DeviceState::Running => "running",
            DeviceState::ShuttingDown => "shutting-down",
            DeviceState::Shutdown => "shutdown",
            DeviceState::Restarting => "restarting",
        };
        f.write_str(name)
    }
}

/// A one-way lifecycle notification
///
/// `Restarting` tells downstream consumers that resources are about to be
/// reacquired; `ShuttingDown`/`Shutdown` that they are gone for good.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    /// Human-readable description
    pub text: String,
    /// Lifecycle state tag
    pub state: DeviceState,
}

impl StatusMessage {
    pub(crate) fn new(text: impl Into<String>, state: DeviceState) -> Self {
        Self {
            text: text.into(),
            state,
        }
    }
}
