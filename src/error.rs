//! Crate error types
//!
//! Contract violations (lifecycle misuse, duplicate registration, buffer size
//! mismatches) surface loudly through these types. Transient per-frame
//! hiccups never do: they are logged where they happen and reported as
//! "no data" so a long-running stream is never interrupted by a bad frame.

use crate::device::SessionPhase;
use crate::stream::StreamKind;
use crate::subscriber::SubscriberId;

/// Error type for session and stream operations
#[derive(Debug)]
pub enum Error {
    /// An operation was attempted from a lifecycle state that forbids it
    InvalidLifecycleTransition {
        /// The state the session was in
        from: SessionPhase,
        /// The operation that was attempted
        operation: &'static str,
    },
    /// A caller-supplied buffer does not match the stream-reported capacity
    BufferSizeMismatch {
        /// Capacity reported by the stream
        expected: usize,
        /// Length of the buffer the caller supplied
        actual: usize,
    },
    /// A subscriber was opened twice for the same stream type
    DuplicateSubscriber {
        /// The offending subscriber
        id: SubscriberId,
        /// The stream type it was already registered for
        kind: StreamKind,
    },
    /// The device has no source for the requested stream type
    SourceUnavailable(StreamKind),
    /// The device failed to open or close
    Device(String),
    /// An I/O failure (observation log)
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidLifecycleTransition { from, operation } => {
                write!(f, "{} is not allowed while the session is {}", operation, from)
            }
            Error::BufferSizeMismatch { expected, actual } => write!(
                f,
                "buffer length {} does not match the stream capacity {}",
                actual, expected
            ),
            Error::DuplicateSubscriber { id, kind } => {
                write!(f, "subscriber {} already has an open {} reader", id, kind)
            }
            Error::SourceUnavailable(kind) => {
                write!(f, "no {} source is available on the device", kind)
            }
            Error::Device(msg) => write!(f, "device error: {}", msg),
            Error::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
