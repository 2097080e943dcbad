//! [`Neighbor`]: a peer from whom an announcement has been received
//! recently enough to be considered live (spec §3.2).
//!
//! Lives in `ryx-types` rather than `ryx-discovery` so that `ryx-behavior`
//! can take neighbors as policy inputs without creating a dependency
//! cycle (Discovery depends on Behavior, not the other way around —
//! spec §1 dependency order).

use crate::node_id::{ClusterTag, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordSystemTag {
    Gps,
    Relative,
    Logical,
    None,
}

/// Optional spatial attachment carried on a neighbor record (spec §3.2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborSpatial {
    pub coord_system: Option<CoordSystemTag>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub zone: Option<String>,
    pub barriers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub node_id: NodeId,
    pub address: String,
    pub port: u16,
    pub cluster_tag: ClusterTag,
    /// Monotonic tick at which the neighbor was last refreshed
    /// (`Clock::monotonic`), not wall-clock time.
    pub last_seen: u64,
    pub spatial: Option<NeighborSpatial>,
    /// Derived distance to self; only populated when both ends carry
    /// compatible coordinate systems.
    pub distance: Option<f64>,
}

impl Neighbor {
    pub fn new(node_id: NodeId, address: String, port: u16, cluster_tag: ClusterTag, now: u64) -> Self {
        Self {
            node_id,
            address,
            port,
            cluster_tag,
            last_seen: now,
            spatial: None,
            distance: None,
        }
    }

    pub fn is_stale(&self, now: u64, staleness_threshold: u64) -> bool {
        now.saturating_sub(self.last_seen) > staleness_threshold
    }

    pub fn zone(&self) -> Option<&str> {
        self.spatial.as_ref().and_then(|s| s.zone.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staleness_is_based_on_monotonic_gap() {
        let n = Neighbor::new(NodeId::new("a"), "127.0.0.1".into(), 9000, ClusterTag::default(), 1000);
        assert!(!n.is_stale(1030, 60));
        assert!(n.is_stale(1100, 60));
    }
}
