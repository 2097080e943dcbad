//! The forward eligibility predicate (spec §4.4): "`should_forward(msg,
//! N)` is true iff all of: energy > 0, N != msg.source, N not in
//! msg.path, behavior policy's should_forward, and (if spatial) the path
//! is not barrier-blocked for this kind."
//!
//! Kept as a free function so it can be unit-tested without constructing
//! a full [`crate::service::Diffusion`].

use ryx_behavior::Policy;
use ryx_spatial::BarrierRegistry;
use ryx_types::{Message, Neighbor};

pub fn is_eligible(msg: &Message, neighbor: &Neighbor, self_zone: Option<&str>, policy: &Policy, barriers: &BarrierRegistry, now: u64) -> bool {
    if msg.energy <= 0.0 {
        return false;
    }
    if neighbor.node_id == msg.source {
        return false;
    }
    if msg.contains_node(&neighbor.node_id) {
        return false;
    }
    if !policy.should_forward(msg, &neighbor.node_id, now) {
        return false;
    }
    if barriers.is_blocked(self_zone, neighbor.zone(), &msg.kind) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ryx_behavior::AdaptiveMetrics;
    use ryx_params::Parameters;
    use ryx_spatial::{Barrier, BarrierType, IsolationClass};
    use ryx_types::{ClusterTag, Metadata, MessageKind, NeighborSpatial, NodeId};
    use std::sync::Arc;

    fn policy() -> Policy {
        Policy::new(Arc::new(Parameters::with_defaults()), Arc::new(AdaptiveMetrics::new()))
    }

    fn neighbor(id: &str, zone: Option<&str>) -> Neighbor {
        let mut n = Neighbor::new(NodeId::new(id), "127.0.0.1".into(), 9000, ClusterTag::default(), 0);
        if let Some(z) = zone {
            n.spatial = Some(NeighborSpatial { zone: Some(z.to_string()), ..Default::default() });
        }
        n
    }

    fn msg(kind: &str, energy: f64) -> Message {
        Message::inject(NodeId::new("a"), MessageKind::new(kind), b"x".to_vec(), energy, 300, 0, Metadata::new())
    }

    #[test]
    fn zero_energy_never_eligible() {
        let p = policy();
        let barriers = BarrierRegistry::empty();
        assert!(!is_eligible(&msg("text", 0.0), &neighbor("b", None), None, &p, &barriers, 0));
    }

    #[test]
    fn source_neighbor_never_eligible() {
        let p = policy();
        let barriers = BarrierRegistry::empty();
        let m = msg("text", 3.0);
        assert!(!is_eligible(&m, &neighbor("a", None), None, &p, &barriers, 0));
    }

    #[test]
    fn neighbor_already_in_path_never_eligible() {
        let p = policy();
        let barriers = BarrierRegistry::empty();
        let mut m = msg("text", 3.0);
        m.path.push(NodeId::new("b"));
        assert!(!is_eligible(&m, &neighbor("b", None), None, &p, &barriers, 0));
    }

    #[test]
    fn security_barrier_blocks_even_with_energy_remaining() {
        let p = policy();
        let barriers = BarrierRegistry::new(vec![Barrier::new("b1", BarrierType::Firewall, "bridge", "engine_bay", IsolationClass::Security)]);
        let m = msg("text", 3.0);
        assert!(!is_eligible(&m, &neighbor("b", Some("engine_bay")), Some("bridge"), &p, &barriers, 0));
    }

    #[test]
    fn fault_barrier_permits_critical_but_not_routine() {
        let p = policy();
        let barriers = BarrierRegistry::new(vec![Barrier::new("b1", BarrierType::Bulkhead, "bridge", "engine_bay", IsolationClass::Fault)]);
        let critical = msg("critical", 3.0);
        let routine = msg("routine", 3.0);
        assert!(is_eligible(&critical, &neighbor("b", Some("engine_bay")), Some("bridge"), &p, &barriers, 0));
        assert!(!is_eligible(&routine, &neighbor("b", Some("engine_bay")), Some("bridge"), &p, &barriers, 0));
    }

    #[test]
    fn missing_spatial_data_degrades_to_always_eligible() {
        let p = policy();
        let barriers = BarrierRegistry::new(vec![Barrier::new("b1", BarrierType::Firewall, "bridge", "engine_bay", IsolationClass::Security)]);
        let m = msg("text", 3.0);
        assert!(is_eligible(&m, &neighbor("b", None), None, &p, &barriers, 0));
    }
}
