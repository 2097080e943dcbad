//! The policy surface itself (spec §4.1 "Policy contract").

use crate::metrics::AdaptiveMetrics;
use ryx_params::Parameters;
use ryx_types::{Message, MessageKind, NodeId};
use std::sync::Arc;
use std::time::Duration;

/// A baseline "typical" neighbor latency used to clip the adaptive
/// energy-decay multiplier's latency term. Not itself a forwarding
/// timeout — see `message_timeout` for that — just the reference point
/// the 2x cap in spec §4.1 is measured against.
const BASELINE_LATENCY_MS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictReason {
    Timeout,
    Unreachable,
    PoorPerformance,
}

/// Consulted by Discovery, Diffusion, and Communication at every decision
/// point named in spec §4.1. Cheap to clone (wraps two `Arc`s); every
/// method is total.
#[derive(Clone)]
pub struct Policy {
    params: Arc<Parameters>,
    metrics: Arc<AdaptiveMetrics>,
}

impl Policy {
    pub fn new(params: Arc<Parameters>, metrics: Arc<AdaptiveMetrics>) -> Self {
        Self { params, metrics }
    }

    pub fn metrics(&self) -> &Arc<AdaptiveMetrics> {
        &self.metrics
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    fn adaptation_enabled(&self) -> bool {
        self.params.get_bool("adaptation_enabled").unwrap_or(false)
    }

    fn learning_rate(&self) -> f64 {
        self.params.get_float("learning_rate").unwrap_or(0.1)
    }

    /// Amount subtracted from `energy` for one forwarding hop to
    /// `neighbor`. Per-class base, then adaptively scaled by observed
    /// latency and reliability against that neighbor (spec §4.1).
    pub fn energy_decay(&self, msg: &Message, neighbor: &NodeId, base: f64) -> f64 {
        let class_base = if msg.kind.is_high_priority() {
            self.params.get_float("decay_critical").unwrap_or(base * 0.2)
        } else if msg.kind.is_low_priority() {
            self.params.get_float("decay_routine").unwrap_or(base * 2.0)
        } else {
            base
        };

        if !self.adaptation_enabled() {
            return class_base;
        }

        let latency_penalty = self.metrics.latency_penalty(neighbor, BASELINE_LATENCY_MS);
        let reliability_penalty = 1.5 * self.metrics.reliability_penalty(neighbor);
        class_base * (1.0 + 0.3 * latency_penalty + 0.4 * reliability_penalty)
    }

    /// `ttl_scale(kind, base_ttl) -> effective_ttl` (spec §4.1).
    pub fn ttl_scale(&self, kind: &MessageKind, base_ttl: u64) -> u64 {
        match kind.as_str() {
            MessageKind::CRITICAL | MessageKind::EMERGENCY => base_ttl.saturating_mul(3),
            MessageKind::ROUTINE | MessageKind::TEMP => base_ttl / 2,
            _ => base_ttl,
        }
    }

    /// `should_forward(msg, neighbor) -> bool` (spec §4.1). Spatial and
    /// already-in-path checks happen in Diffusion's eligibility predicate
    /// — this is just the behavior-layer vote.
    pub fn should_forward(&self, msg: &Message, neighbor: &NodeId, now: u64) -> bool {
        if msg.kind.is_high_priority() {
            return true;
        }
        if !self.adaptation_enabled() {
            return true;
        }
        self.metrics.recent_failure_count(neighbor, msg.kind.as_str(), now) < 3
    }

    /// `neighbor_priority(neighbor, base) -> float` (spec §4.1 and §4.5):
    /// `0.6*network + 0.4*spatial`, clamped to `[0,1]`.
    pub fn neighbor_priority(
        &self,
        neighbor: &NodeId,
        same_zone: bool,
        distance_score: f64,
        system_compatible: bool,
    ) -> f64 {
        let network = self.metrics.network_score(neighbor);
        let mut spatial = distance_score;
        if same_zone {
            spatial += 0.3;
        }
        if system_compatible {
            spatial += 0.1;
        }
        let spatial = spatial.clamp(0.0, 1.0);
        (0.6 * network + 0.4 * spatial).clamp(0.0, 1.0)
    }

    /// `should_admit_neighbor(candidate, current_set) -> bool`: true iff
    /// under capacity; otherwise the caller must run an eviction decision
    /// first (spec §4.2 admission algorithm step 3).
    pub fn should_admit_neighbor(&self, current_len: usize) -> bool {
        let max = self.params.get_int("max_neighbors").unwrap_or(20) as usize;
        current_len < max
    }

    /// `should_evict_neighbor(n, reason) -> bool` (spec §4.1).
    pub fn should_evict_neighbor(&self, reason: EvictReason, score: Option<f64>) -> bool {
        match reason {
            EvictReason::Timeout | EvictReason::Unreachable => true,
            EvictReason::PoorPerformance => {
                let threshold = self.params.get_float("eviction_score_threshold").unwrap_or(0.2);
                score.map(|s| s < threshold).unwrap_or(false)
            }
        }
    }

    /// `retry_delay(target, attempt, base) -> duration`: exponential
    /// backoff `base * 2^attempt` (spec §4.1).
    pub fn retry_delay(&self, attempt: u32, base: Duration) -> Duration {
        base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }

    /// `message_timeout(kind, base) -> duration` (spec §4.1).
    pub fn message_timeout(&self, kind: &MessageKind, base: Duration) -> Duration {
        match kind.as_str() {
            MessageKind::CRITICAL => base.saturating_mul(2),
            MessageKind::ROUTINE => base / 2,
            _ => base,
        }
    }

    /// `cleanup_interval(current, load) -> duration`: halve under high
    /// load (>0.9), double under low load (<0.3), else pass-through
    /// (spec §4.1).
    pub fn cleanup_interval(&self, current: Duration, load: f64) -> Duration {
        if load > 0.9 {
            current / 2
        } else if load < 0.3 {
            current.saturating_mul(2)
        } else {
            current
        }
    }

    /// `should_cleanup_message(msg, memory_pressure) -> bool` (spec
    /// §4.1, §4.4).
    pub fn should_cleanup_message(&self, msg: &Message, memory_pressure: f64, now: u64) -> bool {
        if matches!(
            msg.kind.as_str(),
            MessageKind::CRITICAL | MessageKind::EMERGENCY | MessageKind::SAFETY
        ) {
            return false;
        }
        if memory_pressure > 0.8 && msg.kind.is_low_priority() {
            return true;
        }
        msg.is_expired(now)
    }
}
