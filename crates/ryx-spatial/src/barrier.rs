//! Barriers: declared separations between two zones for a given isolation
//! class (spec §3.4, §4.5).

use ryx_types::MessageKind;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierType {
    Bulkhead,
    Firewall,
    Zone,
    Distance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationClass {
    Fault,
    Maintenance,
    Security,
    Emergency,
}

pub type BarrierId = String;

/// A declared separation between two zones (spec §3.4). Barriers are
/// process-local static data; a node may additionally announce its own
/// for informational use only (the announcement does not, by itself,
/// make a remote barrier enforceable locally).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barrier {
    pub id: BarrierId,
    pub barrier_type: BarrierType,
    pub zone_a: String,
    pub zone_b: String,
    pub isolation: IsolationClass,
}

impl Barrier {
    pub fn new(
        id: impl Into<String>,
        barrier_type: BarrierType,
        zone_a: impl Into<String>,
        zone_b: impl Into<String>,
        isolation: IsolationClass,
    ) -> Self {
        Self {
            id: id.into(),
            barrier_type,
            zone_a: zone_a.into(),
            zone_b: zone_b.into(),
            isolation,
        }
    }

    fn spans(&self, zone_a: &str, zone_b: &str) -> bool {
        (self.zone_a == zone_a && self.zone_b == zone_b)
            || (self.zone_a == zone_b && self.zone_b == zone_a)
    }

    /// Whether this single barrier blocks `kind` between `zone_a` and
    /// `zone_b`, given the process-local maintenance/emergency flags
    /// (spec §4.5 bullet list).
    fn blocks(
        &self,
        zone_a: &str,
        zone_b: &str,
        kind: &MessageKind,
        maintenance_mode: bool,
        emergency_isolation: bool,
    ) -> bool {
        if !self.spans(zone_a, zone_b) {
            return false;
        }
        match self.isolation {
            IsolationClass::Security => true,
            IsolationClass::Fault => {
                !kind.is_high_priority()
                    && (kind.as_str() == MessageKind::TASK || kind.is_low_priority())
            }
            IsolationClass::Maintenance => {
                maintenance_mode && kind.as_str() == MessageKind::ROUTINE
            }
            IsolationClass::Emergency => emergency_isolation,
        }
    }
}

/// Holds the process-local set of barriers plus the two mode flags that
/// modulate maintenance/emergency barrier behavior.
pub struct BarrierRegistry {
    barriers: RwLock<Vec<Barrier>>,
    maintenance_mode: AtomicBool,
    emergency_isolation: AtomicBool,
}

impl BarrierRegistry {
    pub fn new(barriers: Vec<Barrier>) -> Self {
        Self {
            barriers: RwLock::new(barriers),
            maintenance_mode: AtomicBool::new(false),
            emergency_isolation: AtomicBool::new(false),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn add(&self, barrier: Barrier) {
        self.barriers.write().expect("barrier lock poisoned").push(barrier);
    }

    pub fn list(&self) -> Vec<Barrier> {
        self.barriers.read().expect("barrier lock poisoned").clone()
    }

    pub fn set_maintenance_mode(&self, on: bool) {
        self.maintenance_mode.store(on, Ordering::SeqCst);
    }

    pub fn set_emergency_isolation(&self, on: bool) {
        self.emergency_isolation.store(on, Ordering::SeqCst);
    }

    /// True if any declared barrier blocks `kind` from crossing between
    /// `zone_a` and `zone_b`. Missing/empty zone tags never block
    /// (failure semantics: spatial absence degrades to non-spatial
    /// behavior, never message loss).
    pub fn is_blocked(&self, zone_a: Option<&str>, zone_b: Option<&str>, kind: &MessageKind) -> bool {
        let (Some(za), Some(zb)) = (zone_a, zone_b) else {
            return false;
        };
        if za == zb {
            return false;
        }
        let maintenance = self.maintenance_mode.load(Ordering::SeqCst);
        let emergency = self.emergency_isolation.load(Ordering::SeqCst);
        self.barriers
            .read()
            .expect("barrier lock poisoned")
            .iter()
            .any(|b| b.blocks(za, zb, kind, maintenance, emergency))
    }
}

impl Default for BarrierRegistry {
    fn default() -> Self {
        Self::empty()
    }
}
