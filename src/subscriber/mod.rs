//! Subscriber identities, records, and the registry
//!
//! Subscribers are the consumers of the fan-out: each declares which stream
//! types it wants (a capability set with one callback slot per stream kind)
//! and carries a unique identity for the life of the process. The registry
//! collects them for the session to enumerate at start time.

pub mod identity;
pub mod record;
pub mod registry;

pub use identity::{IdentityAllocator, SubscriberId};
pub use record::{FrameCallback, Subscriber, SubscriberBuilder};
pub use registry::SubscriberRegistry;
