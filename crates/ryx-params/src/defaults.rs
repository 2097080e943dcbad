//! Default values for the minimum key set named in spec §3.3.

use crate::value::ParamValue;
use std::collections::HashMap;

pub fn default_parameters() -> HashMap<String, ParamValue> {
    let mut m = HashMap::new();
    let mut set = |k: &str, v: ParamValue| {
        m.insert(k.to_string(), v);
    };

    // Energy decay
    set("base_energy_decay", ParamValue::Float(1.0));
    set("decay_critical", ParamValue::Float(0.2));
    set("decay_routine", ParamValue::Float(2.0));

    // Default injection energies
    set("default_injection_energy_info", ParamValue::Float(10.0));
    set("default_injection_energy_task", ParamValue::Float(15.0));

    // TTL / cleanup
    set("default_ttl_seconds", ParamValue::Int(300));
    set("cleanup_period_secs", ParamValue::Int(30));
    set("cleanup_batch_cap", ParamValue::Int(500));

    // Neighbor capacity
    set("max_neighbors", ParamValue::Int(20));
    set("min_neighbors", ParamValue::Int(4));
    set("neighbor_staleness_secs", ParamValue::Int(60));

    // Discovery
    set("discovery_announce_period_secs", ParamValue::Int(5));
    set("eviction_score_threshold", ParamValue::Float(0.2));

    // Communication
    set("message_timeout_ms", ParamValue::DurationMs(2_000));
    set("retry_count", ParamValue::Int(3));
    set("retry_backoff_base_ms", ParamValue::DurationMs(250));

    // Task execution
    set("max_concurrent_tasks", ParamValue::Int(8));
    set("load_threshold", ParamValue::Float(0.9));

    // Adaptive layer
    set("adaptation_enabled", ParamValue::Bool(true));
    set("learning_rate", ParamValue::Float(0.1));

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_minimum_key_list() {
        let defaults = default_parameters();
        for key in [
            "base_energy_decay",
            "decay_critical",
            "decay_routine",
            "default_injection_energy_info",
            "default_injection_energy_task",
            "default_ttl_seconds",
            "cleanup_period_secs",
            "cleanup_batch_cap",
            "max_neighbors",
            "min_neighbors",
            "neighbor_staleness_secs",
            "discovery_announce_period_secs",
            "message_timeout_ms",
            "retry_count",
            "retry_backoff_base_ms",
            "max_concurrent_tasks",
            "load_threshold",
            "adaptation_enabled",
            "learning_rate",
        ] {
            assert!(defaults.contains_key(key), "missing default for {key}");
        }
    }
}
