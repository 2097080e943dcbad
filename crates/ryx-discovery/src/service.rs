//! The Discovery service (spec §4.2): neighbor admission, liveness sweep,
//! topology optimization, and the queries other components consult.

use crate::announce::AnnounceTargets;
use crate::error::DiscoveryError;
use crate::table::NeighborTable;
use parking_lot::RwLock;
use ryx_behavior::{EvictReason, Policy};
use ryx_comm::AnnouncePayload;
use ryx_params::Parameters;
use ryx_spatial::{distance_between, distance_score, CoordSystem, SpatialConfig};
use ryx_types::{ClusterTag, CoordSystemTag, Neighbor, NeighborSpatial, NodeId};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

fn coord_system_tag_to_config_system(tag: CoordSystemTag) -> CoordSystem {
    match tag {
        CoordSystemTag::Gps => CoordSystem::Gps,
        CoordSystemTag::Relative => CoordSystem::Relative,
        CoordSystemTag::Logical => CoordSystem::Logical,
        CoordSystemTag::None => CoordSystem::None,
    }
}

fn config_system_to_name(system: CoordSystem) -> Option<String> {
    match system {
        CoordSystem::Gps => Some("gps".to_string()),
        CoordSystem::Relative => Some("relative".to_string()),
        CoordSystem::Logical => Some("logical".to_string()),
        CoordSystem::None => None,
    }
}

fn parse_coord_system_tag(raw: &str) -> Result<CoordSystemTag, DiscoveryError> {
    match raw {
        "gps" => Ok(CoordSystemTag::Gps),
        "relative" => Ok(CoordSystemTag::Relative),
        "logical" => Ok(CoordSystemTag::Logical),
        "none" => Ok(CoordSystemTag::None),
        other => Err(DiscoveryError::UnknownCoordSystem(other.to_string())),
    }
}

fn neighbor_spatial_to_config(spatial: &NeighborSpatial) -> SpatialConfig {
    SpatialConfig {
        system: spatial
            .coord_system
            .map(coord_system_tag_to_config_system)
            .unwrap_or(CoordSystem::None),
        x: spatial.x,
        y: spatial.y,
        z: spatial.z,
        zone: spatial.zone.clone(),
    }
}

pub struct Discovery {
    self_id: NodeId,
    cluster_tag: ClusterTag,
    self_spatial: RwLock<SpatialConfig>,
    table: NeighborTable,
    policy: Policy,
    targets: RwLock<AnnounceTargets>,
}

impl Discovery {
    pub fn new(
        self_id: NodeId,
        cluster_tag: ClusterTag,
        self_spatial: SpatialConfig,
        policy: Policy,
        targets: AnnounceTargets,
    ) -> Self {
        Self {
            self_id,
            cluster_tag,
            self_spatial: RwLock::new(self_spatial),
            table: NeighborTable::new(),
            policy,
            targets: RwLock::new(targets),
        }
    }

    pub fn table(&self) -> &NeighborTable {
        &self.table
    }

    pub fn self_id(&self) -> &NodeId {
        &self.self_id
    }

    pub fn self_spatial(&self) -> SpatialConfig {
        self.self_spatial.read().clone()
    }

    pub fn set_self_spatial(&self, cfg: SpatialConfig) {
        *self.self_spatial.write() = cfg;
    }

    pub fn targets(&self) -> Vec<SocketAddr> {
        self.targets.read().resolve()
    }

    pub fn set_targets(&self, targets: AnnounceTargets) {
        *self.targets.write() = targets;
    }

    fn params(&self) -> &Arc<Parameters> {
        self.policy.params()
    }

    /// Adaptive neighbor score combining network performance and spatial
    /// affinity (spec §4.1 `neighbor_priority`, §4.2 admission step 3).
    fn score(&self, neighbor: &Neighbor) -> f64 {
        let self_spatial = self.self_spatial();
        let same_zone = match (&self_spatial.zone, neighbor.zone()) {
            (Some(a), Some(b)) => !a.is_empty() && a == b,
            _ => false,
        };
        let dist_score = neighbor
            .distance
            .map(|d| distance_score(self_spatial.system, Some(d)))
            .unwrap_or(0.0);
        let system_compatible = neighbor
            .spatial
            .as_ref()
            .and_then(|s| s.coord_system)
            .map(|tag| coord_system_tag_to_config_system(tag) == self_spatial.system)
            .unwrap_or(false);
        self.policy
            .neighbor_priority(&neighbor.node_id, same_zone, dist_score, system_compatible)
    }

    fn worst_scoring(&self) -> Option<(NodeId, f64)> {
        self.table
            .all()
            .into_iter()
            .map(|n| (n.node_id.clone(), self.score(&n)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    fn parse_spatial(&self, payload: &AnnouncePayload) -> Result<Option<NeighborSpatial>, DiscoveryError> {
        let Some(raw_system) = payload.coord_system.as_deref() else {
            return Ok(None);
        };
        let tag = parse_coord_system_tag(raw_system)?;
        Ok(Some(NeighborSpatial {
            coord_system: Some(tag),
            x: payload.x,
            y: payload.y,
            z: payload.z,
            zone: payload.zone.clone(),
            barriers: payload.barriers.clone(),
        }))
    }

    /// The admission algorithm (spec §4.2 steps 1-4). Returns whether the
    /// candidate ended up a neighbor; a malformed or rejected announcement
    /// surfaces as `Err`/`Ok(false)` for logging only, never propagated
    /// as a hard failure.
    pub fn handle_announce(
        &self,
        payload: &AnnouncePayload,
        source_addr: String,
        now: u64,
    ) -> Result<bool, DiscoveryError> {
        if payload.node_id == self.self_id {
            return Err(DiscoveryError::SelfAnnouncement);
        }
        if payload.cluster_id != self.cluster_tag.as_str() {
            return Err(DiscoveryError::ClusterMismatch {
                expected: self.cluster_tag.as_str().to_string(),
                got: payload.cluster_id.clone(),
            });
        }

        let candidate_spatial = self.parse_spatial(payload)?;
        let mut neighbor = Neighbor::new(
            payload.node_id.clone(),
            source_addr,
            payload.port,
            self.cluster_tag.clone(),
            now,
        );
        neighbor.distance = candidate_spatial
            .as_ref()
            .map(neighbor_spatial_to_config)
            .and_then(|candidate_cfg| distance_between(&self.self_spatial(), &candidate_cfg));
        neighbor.spatial = candidate_spatial;

        if self.table.contains(&neighbor.node_id) {
            self.table.upsert(neighbor);
            return Ok(true);
        }

        if self.policy.should_admit_neighbor(self.table.len()) {
            debug!(node_id = %neighbor.node_id, "admitted new neighbor");
            self.table.upsert(neighbor);
            return Ok(true);
        }

        if let Some((worst_id, worst_score)) = self.worst_scoring() {
            if self
                .policy
                .should_evict_neighbor(EvictReason::PoorPerformance, Some(worst_score))
            {
                self.table.remove(&worst_id);
                info!(evicted = %worst_id, admitted = %neighbor.node_id, "evicted worst neighbor to admit candidate");
                self.table.upsert(neighbor);
                return Ok(true);
            }
        }

        debug!(node_id = %neighbor.node_id, "neighbor table at capacity, candidate not admitted");
        Ok(false)
    }

    pub fn all_neighbors(&self) -> Vec<Neighbor> {
        self.table.all()
    }

    pub fn neighbors_with_distance(&self) -> Vec<Neighbor> {
        self.table.all().into_iter().filter(|n| n.distance.is_some()).collect()
    }

    pub fn neighbors_in_zone(&self, zone: &str) -> Vec<Neighbor> {
        self.table.in_zone(zone)
    }

    pub fn neighbors_outside_zone(&self, zone: &str) -> Vec<Neighbor> {
        self.table.outside_zone(zone)
    }

    /// `round(0.7 * max_neighbors)` best same-zone neighbors plus the
    /// remainder best cross-zone, both ordered by adaptive score (spec
    /// §4.2). Falls back to a flat top-N when self has no zone.
    pub fn select_optimal(&self) -> Vec<Neighbor> {
        let max_neighbors = self.params().get_int("max_neighbors").unwrap_or(20).max(0) as usize;
        let self_zone = self.self_spatial().zone.filter(|z| !z.is_empty());

        let Some(zone) = self_zone else {
            let mut all = self.table.all();
            all.sort_by(|a, b| self.score(b).partial_cmp(&self.score(a)).unwrap_or(std::cmp::Ordering::Equal));
            all.truncate(max_neighbors);
            return all;
        };

        let mut same = self.table.in_zone(&zone);
        let mut cross = self.table.outside_zone(&zone);
        same.sort_by(|a, b| self.score(b).partial_cmp(&self.score(a)).unwrap_or(std::cmp::Ordering::Equal));
        cross.sort_by(|a, b| self.score(b).partial_cmp(&self.score(a)).unwrap_or(std::cmp::Ordering::Equal));

        let same_target = ((max_neighbors as f64) * 0.7).round() as usize;
        let mut result: Vec<Neighbor> = same.into_iter().take(same_target).collect();
        let remaining = max_neighbors.saturating_sub(result.len());
        result.extend(cross.into_iter().take(remaining));
        result
    }

    /// Removes neighbors past `neighbor_staleness_secs` (spec §4.2
    /// liveness sweep, default 60s threshold / 30s cadence owned by the
    /// caller's timer).
    pub fn run_stale_sweep(&self, now: u64) -> Vec<NodeId> {
        let staleness = self.params().get_int("neighbor_staleness_secs").unwrap_or(60).max(0) as u64;
        let stale = self.table.stale(now, staleness);
        for id in &stale {
            self.table.remove(id);
            info!(%id, "evicted stale neighbor");
        }
        stale
    }

    /// Walks current neighbors and evicts the worst-scoring one at a time
    /// while `should_evict_neighbor(PoorPerformance, score)` is true and
    /// `|neighbors| > min_neighbors` (spec §4.2 optimization timer).
    pub fn run_optimization(&self) -> Vec<NodeId> {
        let min_neighbors = self.params().get_int("min_neighbors").unwrap_or(4).max(0) as usize;
        let mut evicted = Vec::new();
        loop {
            if self.table.len() <= min_neighbors {
                break;
            }
            let Some((worst_id, worst_score)) = self.worst_scoring() else {
                break;
            };
            if self.policy.should_evict_neighbor(EvictReason::PoorPerformance, Some(worst_score)) {
                self.table.remove(&worst_id);
                info!(%worst_id, "optimization evicted persistently poor neighbor");
                evicted.push(worst_id);
            } else {
                break;
            }
        }
        evicted
    }

    pub fn build_announce_payload(&self, data_port: u16, now: u64) -> AnnouncePayload {
        let spatial = self.self_spatial();
        AnnouncePayload {
            node_id: self.self_id.clone(),
            cluster_id: self.cluster_tag.as_str().to_string(),
            port: data_port,
            timestamp: now,
            coord_system: config_system_to_name(spatial.system),
            x: spatial.x,
            y: spatial.y,
            z: spatial.z,
            zone: spatial.zone,
            barriers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ryx_behavior::AdaptiveMetrics;
    use ryx_params::{ParamValue, Parameters};

    fn discovery_with_capacity(max_neighbors: i64, min_neighbors: i64) -> Discovery {
        let params = Arc::new(Parameters::with_defaults());
        params.set("max_neighbors", ParamValue::Int(max_neighbors)).unwrap();
        params.set("min_neighbors", ParamValue::Int(min_neighbors)).unwrap();
        let policy = Policy::new(params, Arc::new(AdaptiveMetrics::new()));
        Discovery::new(
            NodeId::new("self"),
            ClusterTag::default(),
            SpatialConfig::none(),
            policy,
            AnnounceTargets::default_dev(),
        )
    }

    fn announce(node_id: &str, port: u16) -> AnnouncePayload {
        AnnouncePayload {
            node_id: NodeId::new(node_id),
            cluster_id: "default".to_string(),
            port,
            timestamp: 0,
            coord_system: None,
            x: None,
            y: None,
            z: None,
            zone: None,
            barriers: vec![],
        }
    }

    #[test]
    fn rejects_self_announcement() {
        let d = discovery_with_capacity(20, 4);
        let err = d
            .handle_announce(&announce("self", 9000), "127.0.0.1".into(), 0)
            .unwrap_err();
        assert_eq!(err, DiscoveryError::SelfAnnouncement);
    }

    #[test]
    fn rejects_cross_cluster_announcement() {
        let d = discovery_with_capacity(20, 4);
        let mut a = announce("peer", 9000);
        a.cluster_id = "other".to_string();
        assert!(d.handle_announce(&a, "127.0.0.1".into(), 0).is_err());
    }

    #[test]
    fn admits_under_capacity() {
        let d = discovery_with_capacity(20, 4);
        let admitted = d.handle_announce(&announce("peer", 9000), "127.0.0.1".into(), 0).unwrap();
        assert!(admitted);
        assert_eq!(d.table().len(), 1);
    }

    #[test]
    fn reannouncement_refreshes_rather_than_duplicates() {
        let d = discovery_with_capacity(20, 4);
        d.handle_announce(&announce("peer", 9000), "127.0.0.1".into(), 0).unwrap();
        d.handle_announce(&announce("peer", 9000), "127.0.0.1".into(), 10).unwrap();
        assert_eq!(d.table().len(), 1);
        assert_eq!(d.table().get(&NodeId::new("peer")).unwrap().last_seen, 10);
    }

    #[test]
    fn self_never_becomes_a_neighbor_even_via_table_directly() {
        let d = discovery_with_capacity(20, 4);
        assert!(!d.table().contains(d.self_id()));
    }

    #[test]
    fn stale_sweep_removes_expired_neighbors() {
        let d = discovery_with_capacity(20, 4);
        d.handle_announce(&announce("peer", 9000), "127.0.0.1".into(), 0).unwrap();
        let evicted = d.run_stale_sweep(1000);
        assert_eq!(evicted, vec![NodeId::new("peer")]);
        assert!(d.table().is_empty());
    }

    #[test]
    fn zone_selection_meets_70_30_target() {
        let d = discovery_with_capacity(4, 1);
        d.set_self_spatial(SpatialConfig {
            system: CoordSystem::Logical,
            zone: Some("bridge".to_string()),
            ..Default::default()
        });
        let bridge_announce = |id: &str| {
            let mut a = announce(id, 9000);
            a.coord_system = Some("logical".to_string());
            a.zone = Some("bridge".to_string());
            a
        };
        let engine_announce = |id: &str| {
            let mut a = announce(id, 9000);
            a.coord_system = Some("logical".to_string());
            a.zone = Some("engine_bay".to_string());
            a
        };
        d.handle_announce(&bridge_announce("b1"), "127.0.0.1".into(), 0).unwrap();
        d.handle_announce(&bridge_announce("b2"), "127.0.0.1".into(), 0).unwrap();
        d.handle_announce(&engine_announce("e1"), "127.0.0.1".into(), 0).unwrap();
        d.handle_announce(&engine_announce("e2"), "127.0.0.1".into(), 0).unwrap();

        let selected = d.select_optimal();
        let bridge_count = selected.iter().filter(|n| n.zone() == Some("bridge")).count();
        let engine_count = selected.iter().filter(|n| n.zone() == Some("engine_bay")).count();
        assert!(bridge_count >= 2, "expected >=2 bridge neighbors, got {bridge_count}");
        assert!(engine_count >= 1, "expected >=1 engine_bay neighbor, got {engine_count}");
    }
}
