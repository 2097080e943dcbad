//! # Runtime Parameters
//!
//! Centralizes every knob the rest of the node reads at decision points
//! (spec §3.3, §4.1): a keyed bag of tunables behind typed accessors,
//! rather than the dynamic value container the teacher's `qc-*` crates
//! avoid in their own config layers — see spec §9 "Parameter bag with
//! heterogeneous values": a tagged union of a small set of admissible
//! types is sufficient.
//!
//! Reads never block each other; writes are serialized with readers
//! (spec §5: "Parameter bag: reader-preferred lock; per-key set
//! operations acquire exclusive briefly").

mod defaults;
mod value;

pub use defaults::default_parameters;
pub use value::{ParamValue, ParamsError};

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// The runtime-mutable parameter bag, shared (via `Arc`) across Discovery,
/// Diffusion, Communication, and Behavior.
pub struct Parameters {
    inner: RwLock<HashMap<String, ParamValue>>,
}

impl Parameters {
    /// Start from a fixed set of defaults (spec §3.3's minimum key list).
    pub fn with_defaults() -> Self {
        Self {
            inner: RwLock::new(default_parameters()),
        }
    }

    pub fn from_map(map: HashMap<String, ParamValue>) -> Self {
        Self {
            inner: RwLock::new(map),
        }
    }

    /// `get(key) -> value | absent`.
    pub fn get(&self, key: &str) -> Option<ParamValue> {
        self.inner.read().get(key).cloned()
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_float())
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_int())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_duration(&self, key: &str) -> Option<Duration> {
        self.get(key).and_then(|v| v.as_duration())
    }

    /// `set(key, value) -> ok?`. Rejects a value of the wrong kind when
    /// the key already holds a value of a different kind (spec §3.3:
    /// "set operations reject values of the wrong kind"). Unknown keys
    /// are admitted as-is — the parameter bag does not enumerate a fixed
    /// schema, only a set of defaults.
    pub fn set(&self, key: &str, value: ParamValue) -> Result<(), ParamsError> {
        let mut guard = self.inner.write();
        if let Some(existing) = guard.get(key) {
            if !existing.same_kind(&value) {
                warn!(key, expected = existing.kind_name(), got = value.kind_name(), "rejected parameter write of the wrong kind");
                return Err(ParamsError::TypeMismatch {
                    key: key.to_string(),
                    expected: existing.kind_name(),
                    got: value.kind_name(),
                });
            }
        }
        debug!(key, "parameter set");
        guard.insert(key.to_string(), value);
        Ok(())
    }

    /// `batch_set(map) -> per-key results`. Serialized as a whole (one
    /// lock acquisition) but not transactional: a failing key does not
    /// roll back keys that already succeeded (spec §3.3).
    pub fn batch_set(
        &self,
        updates: HashMap<String, ParamValue>,
    ) -> HashMap<String, Result<(), ParamsError>> {
        let mut guard = self.inner.write();
        let mut results = HashMap::with_capacity(updates.len());
        for (key, value) in updates {
            let outcome = match guard.get(&key) {
                Some(existing) if !existing.same_kind(&value) => {
                    warn!(key = %key, expected = existing.kind_name(), got = value.kind_name(), "batch write rejected a key of the wrong kind");
                    Err(ParamsError::TypeMismatch {
                        key: key.clone(),
                        expected: existing.kind_name(),
                        got: value.kind_name(),
                    })
                }
                _ => {
                    guard.insert(key.clone(), value);
                    Ok(())
                }
            };
            results.insert(key, outcome);
        }
        debug!(count = results.len(), "batch parameter write applied");
        results
    }

    /// `snapshot() -> value map`, used by the control surface's read-all
    /// parameter endpoint and by observability projections.
    pub fn snapshot(&self) -> HashMap<String, ParamValue> {
        self.inner.read().clone()
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_default_values() {
        let params = Parameters::with_defaults();
        assert_eq!(params.get_int("max_neighbors"), Some(20));
        assert!(params.get_float("base_energy_decay").is_some());
    }

    #[test]
    fn set_rejects_wrong_kind_against_existing_value() {
        let params = Parameters::with_defaults();
        let err = params
            .set("max_neighbors", ParamValue::Float(1.5))
            .unwrap_err();
        assert!(matches!(err, ParamsError::TypeMismatch { .. }));
    }

    #[test]
    fn set_admits_new_keys_of_any_kind() {
        let params = Parameters::with_defaults();
        assert!(params.set("custom_flag", ParamValue::Bool(true)).is_ok());
        assert_eq!(params.get_bool("custom_flag"), Some(true));
    }

    #[test]
    fn batch_set_reports_per_key_and_does_not_roll_back() {
        let params = Parameters::with_defaults();
        let mut updates = HashMap::new();
        updates.insert("max_neighbors".to_string(), ParamValue::Int(30));
        updates.insert("min_neighbors".to_string(), ParamValue::Bool(true)); // wrong kind
        let results = params.batch_set(updates);

        assert!(results["max_neighbors"].is_ok());
        assert!(results["min_neighbors"].is_err());
        // The successful key took effect even though the other failed.
        assert_eq!(params.get_int("max_neighbors"), Some(30));
    }

    #[test]
    fn snapshot_reflects_live_state() {
        let params = Parameters::with_defaults();
        params.set("max_neighbors", ParamValue::Int(42)).unwrap();
        let snap = params.snapshot();
        assert_eq!(snap.get("max_neighbors"), Some(&ParamValue::Int(42)));
    }
}
