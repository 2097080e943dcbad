//! The neighbor table (spec §3.2): reader-preferred lock, exactly one
//! [`Neighbor`] per [`NodeId`], self never a member.

use parking_lot::RwLock;
use ryx_types::{Neighbor, NodeId};
use std::collections::HashMap;

#[derive(Default)]
pub struct NeighborTable {
    inner: RwLock<HashMap<NodeId, Neighbor>>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.inner.read().contains_key(node_id)
    }

    pub fn get(&self, node_id: &NodeId) -> Option<Neighbor> {
        self.inner.read().get(node_id).cloned()
    }

    /// Insert a brand-new neighbor or refresh an existing one in place.
    pub fn upsert(&self, neighbor: Neighbor) {
        self.inner.write().insert(neighbor.node_id.clone(), neighbor);
    }

    pub fn remove(&self, node_id: &NodeId) -> Option<Neighbor> {
        self.inner.write().remove(node_id)
    }

    /// A consistent snapshot, taken under the read lock and cloned out so
    /// callers never hold the lock across I/O (spec §5).
    pub fn all(&self) -> Vec<Neighbor> {
        self.inner.read().values().cloned().collect()
    }

    pub fn in_zone(&self, zone: &str) -> Vec<Neighbor> {
        self.all()
            .into_iter()
            .filter(|n| n.zone() == Some(zone))
            .collect()
    }

    pub fn outside_zone(&self, zone: &str) -> Vec<Neighbor> {
        self.all()
            .into_iter()
            .filter(|n| n.zone() != Some(zone))
            .collect()
    }

    pub fn stale(&self, now: u64, staleness_threshold: u64) -> Vec<NodeId> {
        self.all()
            .into_iter()
            .filter(|n| n.is_stale(now, staleness_threshold))
            .map(|n| n.node_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ryx_types::ClusterTag;

    fn neighbor(id: &str, zone: Option<&str>) -> Neighbor {
        let mut n = Neighbor::new(NodeId::new(id), "127.0.0.1".into(), 9000, ClusterTag::default(), 0);
        if let Some(z) = zone {
            n.spatial = Some(ryx_types::NeighborSpatial {
                zone: Some(z.to_string()),
                ..Default::default()
            });
        }
        n
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let table = NeighborTable::new();
        table.upsert(neighbor("a", None));
        assert!(table.contains(&NodeId::new("a")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn zone_filters_partition_correctly() {
        let table = NeighborTable::new();
        table.upsert(neighbor("a", Some("bridge")));
        table.upsert(neighbor("b", Some("engine_bay")));
        table.upsert(neighbor("c", None));
        assert_eq!(table.in_zone("bridge").len(), 1);
        assert_eq!(table.outside_zone("bridge").len(), 2);
    }

    #[test]
    fn stale_lists_neighbors_past_threshold() {
        let table = NeighborTable::new();
        let mut n = neighbor("a", None);
        n.last_seen = 0;
        table.upsert(n);
        assert_eq!(table.stale(100, 60), vec![NodeId::new("a")]);
        assert!(table.stale(30, 60).is_empty());
    }

    #[test]
    fn remove_drops_entry() {
        let table = NeighborTable::new();
        table.upsert(neighbor("a", None));
        assert!(table.remove(&NodeId::new("a")).is_some());
        assert!(table.is_empty());
    }
}
