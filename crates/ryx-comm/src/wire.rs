//! The self-describing wire format (spec §6.1).
//!
//! One datagram = one JSON object with a `type` tag. Unknown types are
//! dropped by the receive loop rather than rejected at parse time, so a
//! future kind never requires a schema bump — `serde`'s internally
//! tagged enum naturally falls back to a parse error only when `type`
//! itself is missing or unrecognized, which the receive loop treats the
//! same way as any other malformed datagram.

use crate::error::CommError;
use ryx_types::{Message, MessageKind, Metadata, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `announce`: `{type, node_id, cluster_id, port, timestamp,
/// [coord_system, x, y, z, zone, barriers]}` (spec §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncePayload {
    pub node_id: NodeId,
    pub cluster_id: String,
    pub port: u16,
    pub timestamp: u64,
    #[serde(default)]
    pub coord_system: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub barriers: Vec<String>,
}

/// The full [`Message`] record, wire-shaped: payload is base64 rather
/// than a raw byte array (spec §6.1: "payload (base64 bytes)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageWire {
    pub id: String,
    pub kind: String,
    pub payload: String,
    pub energy: f64,
    pub ttl: u64,
    pub hops: u32,
    pub source: NodeId,
    pub path: Vec<NodeId>,
    pub created_at: u64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl MessageWire {
    pub fn from_message(msg: &Message) -> Self {
        use base64::Engine;
        Self {
            id: msg.id.to_hex(),
            kind: msg.kind.as_str().to_string(),
            payload: base64::engine::general_purpose::STANDARD.encode(&msg.payload),
            energy: msg.energy,
            ttl: msg.ttl,
            hops: msg.hops,
            source: msg.source.clone(),
            path: msg.path.clone(),
            created_at: msg.created_at,
            metadata: msg.metadata.clone(),
        }
    }

    /// Reconstructs a [`Message`]. The id is always recomputed from the
    /// payload rather than trusted off the wire — content-addressing
    /// means a tampered id can never enter the store, and an honest
    /// sender's wire id agrees with the recomputed hash by construction.
    pub fn into_message(self) -> Result<Message, CommError> {
        use base64::Engine;
        let payload = base64::engine::general_purpose::STANDARD
            .decode(self.payload)
            .map_err(|e| {
                CommError::Encode(serde_json::Error::io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    e,
                )))
            })?;
        let id = ryx_types::hash_payload(&payload);
        Ok(Message {
            id,
            kind: MessageKind::new(self.kind),
            payload,
            energy: self.energy,
            ttl: self.ttl,
            hops: self.hops,
            source: self.source,
            path: self.path,
            created_at: self.created_at,
            metadata: self.metadata,
        })
    }
}

/// Opaque carrier for the experimental CA boundary engine (spec §6.1):
/// never decoded, only stored and forwarded through the normal Diffusion
/// path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaBoundaryPayload {
    #[serde(flatten)]
    pub opaque: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEnvelope {
    Announce(AnnouncePayload),
    Info(MessageWire),
    CaBoundary(CaBoundaryPayload),
}

impl WireEnvelope {
    pub fn wire_type(&self) -> &'static str {
        match self {
            WireEnvelope::Announce(_) => "announce",
            WireEnvelope::Info(_) => "info",
            WireEnvelope::CaBoundary(_) => "ca_boundary",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CommError> {
        serde_json::to_vec(self).map_err(CommError::Encode)
    }

    /// Returns `None` (rather than erroring) on malformed or unknown
    /// datagrams — peer-side malformed input is silently dropped per
    /// spec §7.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }

    pub fn info(msg: &Message) -> Self {
        WireEnvelope::Info(MessageWire::from_message(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ryx_types::MessageKind;

    #[test]
    fn announce_round_trips() {
        let payload = AnnouncePayload {
            node_id: NodeId::new("a"),
            cluster_id: "default".into(),
            port: 9000,
            timestamp: 1234,
            coord_system: Some("gps".into()),
            x: Some(1.0),
            y: Some(2.0),
            z: None,
            zone: Some("bridge".into()),
            barriers: vec![],
        };
        let envelope = WireEnvelope::Announce(payload);
        let bytes = envelope.encode().unwrap();
        let decoded = WireEnvelope::decode(&bytes).unwrap();
        assert_eq!(decoded.wire_type(), "announce");
    }

    #[test]
    fn info_round_trips_and_preserves_payload() {
        let msg = Message::inject(
            NodeId::new("a"),
            MessageKind::new("text"),
            b"hello".to_vec(),
            3.0,
            300,
            1000,
            Metadata::new(),
        );
        let envelope = WireEnvelope::info(&msg);
        let bytes = envelope.encode().unwrap();
        let decoded = WireEnvelope::decode(&bytes).unwrap();
        match decoded {
            WireEnvelope::Info(wire) => {
                let restored = wire.into_message().unwrap();
                assert_eq!(restored.id, msg.id);
                assert_eq!(restored.payload, msg.payload);
                assert_eq!(restored.path, msg.path);
            }
            _ => panic!("expected info variant"),
        }
    }

    #[test]
    fn unknown_type_fails_to_decode() {
        let raw = br#"{"type": "frobnicate", "x": 1}"#;
        assert!(WireEnvelope::decode(raw).is_none());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(WireEnvelope::decode(b"not json at all").is_none());
    }
}
