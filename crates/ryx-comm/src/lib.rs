//! # Communication
//!
//! One datagram socket per node for peer-to-peer payloads (spec §4.3):
//! serializes outbound messages, deserializes inbound, and dispatches by
//! kind to the correct handler. Ordering is never guaranteed — receivers
//! must be idempotent, which Diffusion satisfies by deduping on
//! [`ryx_types::MessageId`].
//!
//! Grounded in the teacher's outbound-port pattern
//! (`qc-05-block-propagation::ports::outbound::PeerNetwork`) for the
//! send-side trait, generalized here to the handler-registration table
//! the design notes call for (spec §9: "a mapping from kind string to a
//! function... use tagged variants for the dispatch rather than
//! reflection").

mod error;
mod service;
mod socket;
mod wire;

pub use error::CommError;
pub use service::{Communication, MessageHandler};
pub use socket::{DatagramSocket, UdpDatagramSocket};
pub use wire::{AnnouncePayload, WireEnvelope};
