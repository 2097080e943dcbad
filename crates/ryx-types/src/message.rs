//! The diffused unit: [`Message`], its content-derived [`MessageId`], and
//! the open [`MessageKind`] tag set (spec §3.1).

use crate::error::TypesError;
use crate::node_id::NodeId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Content-derived fingerprint: the first 8 bytes of SHA-256 over the raw
/// payload, hex-encoded to 16 characters.
///
/// Spec §9 notes the source truncates to 8 bytes, which is "sufficient for
/// local dedup but thin for global uniqueness", and explicitly leaves the
/// choice of a longer prefix open to implementers. Eight bytes is kept here
/// to match the documented behavior; widening it is a one-line change
/// (`TRUNCATED_LEN`) if global collision resistance becomes a concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId([u8; MessageId::TRUNCATED_LEN]);

impl MessageId {
    const TRUNCATED_LEN: usize = 8;

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses the hex form produced by [`MessageId::to_hex`], e.g. from a
    /// control-surface URL path segment.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let bytes = hex::decode(s).map_err(|_| TypesError::MalformedId(s.to_string()))?;
        if bytes.len() != Self::TRUNCATED_LEN {
            return Err(TypesError::MalformedId(s.to_string()));
        }
        let mut truncated = [0u8; Self::TRUNCATED_LEN];
        truncated.copy_from_slice(&bytes);
        Ok(MessageId(truncated))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Compute the content id of a payload: `id == hash(payload)` (invariant 1).
pub fn hash_payload(payload: &[u8]) -> MessageId {
    let digest = Sha256::digest(payload);
    let mut truncated = [0u8; MessageId::TRUNCATED_LEN];
    truncated.copy_from_slice(&digest[..MessageId::TRUNCATED_LEN]);
    MessageId(truncated)
}

/// Open string tag classifying a message. Behavior policy interprets a set
/// of well-known kinds; unrecognized kinds fall back to default handling
/// rather than being rejected, since the set is explicitly open (spec §3.1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKind(String);

impl MessageKind {
    pub const TEXT: &'static str = "text";
    pub const TASK: &'static str = "task";
    pub const RESULT: &'static str = "result";
    pub const CRITICAL: &'static str = "critical";
    pub const EMERGENCY: &'static str = "emergency";
    pub const SAFETY: &'static str = "safety";
    pub const ROUTINE: &'static str = "routine";
    pub const TEMP: &'static str = "temp";
    pub const CA_BOUNDARY: &'static str = "ca_boundary";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `critical | emergency | safety`: never eagerly cleaned up, always
    /// forwarded, decays slowly, TTL scaled up (spec §4.1, §4.4).
    pub fn is_high_priority(&self) -> bool {
        matches!(self.0.as_str(), Self::CRITICAL | Self::EMERGENCY | Self::SAFETY)
    }

    /// `routine | temp | info | log`: decays faster, TTL scaled down,
    /// eagerly cleaned under memory pressure (spec §4.1).
    pub fn is_low_priority(&self) -> bool {
        matches!(self.0.as_str(), Self::ROUTINE | Self::TEMP | "info" | "log")
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageKind {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Free-form metadata value. A small closed set rather than arbitrary JSON
/// keeps forwarded copies cheap to clone and compare in tests.
pub type Metadata = HashMap<String, serde_json::Value>;

/// The diffused unit (spec §3.1).
///
/// Never mutated in place: forwarding produces a fresh [`Message`] with
/// updated `energy`, `hops`, and `path` via [`Message::forwarded_copy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub kind: MessageKind,
    pub payload: Vec<u8>,
    pub energy: f64,
    pub ttl: u64,
    pub hops: u32,
    pub source: NodeId,
    pub path: Vec<NodeId>,
    pub created_at: u64,
    pub metadata: Metadata,
}

impl Message {
    /// Construct a freshly-injected message: `hops=0`, `path=[source]`
    /// (spec §4.4 Inject step 2).
    pub fn inject(
        source: NodeId,
        kind: MessageKind,
        payload: Vec<u8>,
        energy: f64,
        ttl: u64,
        created_at: u64,
        metadata: Metadata,
    ) -> Self {
        let id = hash_payload(&payload);
        Self {
            id,
            kind,
            path: vec![source.clone()],
            payload,
            energy,
            ttl,
            hops: 0,
            source,
            created_at,
            metadata,
        }
    }

    /// Whether `ttl` has passed as of `now` (invariant 6).
    pub fn is_expired(&self, now: u64) -> bool {
        self.ttl <= now
    }

    /// Build the forwarded copy this node would hand to a neighbor:
    /// same id/kind/payload/ttl/source/created_at/metadata, decremented
    /// energy, incremented hops, and `local_node` appended to the path
    /// (spec §4.4, testable property 3).
    pub fn forwarded_copy(&self, local_node: &NodeId, decay: f64) -> Self {
        let mut path = self.path.clone();
        path.push(local_node.clone());
        Self {
            id: self.id,
            kind: self.kind.clone(),
            payload: self.payload.clone(),
            energy: (self.energy - decay).max(0.0),
            ttl: self.ttl,
            hops: self.hops + 1,
            source: self.source.clone(),
            path,
            created_at: self.created_at,
            metadata: self.metadata.clone(),
        }
    }

    /// Checks the six storage invariants from spec §3.1 and §8.
    pub fn validate(&self) -> Result<(), TypesError> {
        if hash_payload(&self.payload) != self.id {
            return Err(TypesError::IdMismatch);
        }
        let Some(first) = self.path.first() else {
            return Err(TypesError::EmptyPath);
        };
        if first != &self.source {
            return Err(TypesError::IdMismatch);
        }
        let mut seen = std::collections::HashSet::with_capacity(self.path.len());
        for node in &self.path {
            if !seen.insert(node) {
                return Err(TypesError::DuplicatePathEntry(node.to_string()));
            }
        }
        let expected = (self.path.len() - 1) as u32;
        if self.hops != expected {
            return Err(TypesError::HopsMismatch {
                hops: self.hops,
                expected,
            });
        }
        if self.energy < 0.0 {
            return Err(TypesError::NegativeEnergy(self.energy));
        }
        Ok(())
    }

    /// `path[-1]`: the most recent forwarder, not necessarily the current
    /// node (invariant 7).
    pub fn last_forwarder(&self) -> &NodeId {
        self.path.last().expect("path is never empty")
    }

    pub fn contains_node(&self, node: &NodeId) -> bool {
        self.path.contains(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(n: &str) -> NodeId {
        NodeId::new(n.to_string())
    }

    #[test]
    fn id_is_content_derived() {
        let a = hash_payload(b"hello");
        let b = hash_payload(b"hello");
        let c = hash_payload(b"world");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn inject_sets_hops_zero_and_single_element_path() {
        let m = Message::inject(
            node("a"),
            MessageKind::new(MessageKind::TEXT),
            b"hello".to_vec(),
            3.0,
            300,
            1000,
            Metadata::new(),
        );
        assert_eq!(m.hops, 0);
        assert_eq!(m.path, vec![node("a")]);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn forwarded_copy_bumps_hops_and_appends_path() {
        let m = Message::inject(
            node("a"),
            MessageKind::new(MessageKind::TEXT),
            b"hello".to_vec(),
            3.0,
            300,
            1000,
            Metadata::new(),
        );
        let fwd = m.forwarded_copy(&node("b"), 1.0);
        assert_eq!(fwd.id, m.id);
        assert_eq!(fwd.hops, 1);
        assert_eq!(fwd.path, vec![node("a"), node("b")]);
        assert!((fwd.energy - 2.0).abs() < f64::EPSILON);
        assert!(fwd.validate().is_ok());
    }

    #[test]
    fn energy_never_goes_negative() {
        let m = Message::inject(
            node("a"),
            MessageKind::new(MessageKind::TEXT),
            b"x".to_vec(),
            1.0,
            300,
            1000,
            Metadata::new(),
        );
        let fwd = m.forwarded_copy(&node("b"), 5.0);
        assert_eq!(fwd.energy, 0.0);
    }

    #[test]
    fn validate_rejects_tampered_payload() {
        let mut m = Message::inject(
            node("a"),
            MessageKind::new(MessageKind::TEXT),
            b"hello".to_vec(),
            3.0,
            300,
            1000,
            Metadata::new(),
        );
        m.payload = b"tampered".to_vec();
        assert_eq!(m.validate(), Err(TypesError::IdMismatch));
    }

    #[test]
    fn validate_rejects_duplicate_path_entries() {
        let mut m = Message::inject(
            node("a"),
            MessageKind::new(MessageKind::TEXT),
            b"hello".to_vec(),
            3.0,
            300,
            1000,
            Metadata::new(),
        );
        m.path.push(node("a"));
        m.hops = 1;
        assert!(matches!(
            m.validate(),
            Err(TypesError::DuplicatePathEntry(_))
        ));
    }

    #[test]
    fn message_id_hex_round_trips() {
        let id = hash_payload(b"hello");
        assert_eq!(MessageId::from_hex(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn message_id_from_hex_rejects_wrong_length() {
        assert!(MessageId::from_hex("ab").is_err());
        assert!(MessageId::from_hex("not hex").is_err());
    }

    #[test]
    fn high_and_low_priority_kinds() {
        assert!(MessageKind::new("critical").is_high_priority());
        assert!(MessageKind::new("emergency").is_high_priority());
        assert!(MessageKind::new("routine").is_low_priority());
        assert!(!MessageKind::new("text").is_high_priority());
        assert!(!MessageKind::new("text").is_low_priority());
    }
}
