//! # Shared Types
//!
//! Wire and domain types shared across every Ryx subsystem: node identity,
//! the content-addressed [`Message`], and the [`Clock`] abstraction used
//! wherever a component needs to read wall-clock or monotonic time in a
//! testable way.
//!
//! Kept deliberately small and dependency-light: every other crate in the
//! workspace depends on this one, so it must never depend back on them.

pub mod clock;
pub mod error;
pub mod message;
pub mod neighbor;
pub mod node_id;

pub use clock::{test_support, Clock, SystemClock};
pub use error::TypesError;
pub use message::{hash_payload, Message, MessageId, MessageKind, Metadata};
pub use neighbor::{CoordSystemTag, Neighbor, NeighborSpatial};
pub use node_id::{ClusterTag, NodeId};
