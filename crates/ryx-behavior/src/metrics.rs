//! Adaptive metrics: bounded sliding windows and EMA state (spec §4.1,
//! §9 "prefer fixed-size ring buffers over growing lists; EMA state is a
//! single float per neighbor per metric — no dynamic allocation per
//! sample").

use parking_lot::RwLock;
use ryx_types::NodeId;
use std::collections::{HashMap, VecDeque};

const LATENCY_WINDOW: usize = 20;
const LOAD_WINDOW: usize = 100;
const FAULT_WINDOW_SECS: u64 = 300; // 5 minutes

/// A fixed-capacity FIFO ring buffer. Pushing past capacity evicts the
/// oldest sample — no growth, no per-sample allocation beyond the initial
/// `VecDeque` backing store.
#[derive(Debug, Clone)]
struct RingBuffer<T> {
    capacity: usize,
    samples: VecDeque<T>,
}

impl<T> RingBuffer<T> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }
}

impl RingBuffer<f64> {
    fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTrend {
    Rising,
    Falling,
    Steady,
}

#[derive(Debug, Clone, Default)]
struct NeighborStats {
    latencies_ms: Option<RingBuffer<f64>>,
    /// EMA of delivery success in `[0,1]`.
    ema_success: f64,
    seen_success_sample: bool,
}

impl NeighborStats {
    fn latencies(&mut self) -> &mut RingBuffer<f64> {
        self.latencies_ms.get_or_insert_with(|| RingBuffer::new(LATENCY_WINDOW))
    }
}

#[derive(Debug, Clone, Default)]
struct FaultPattern {
    ema_success: f64,
    seen_success_sample: bool,
    last_failure_at: Option<u64>,
    /// Timestamps of failures within the trailing window, for the
    /// recent-failure-count rule in `should_forward`.
    recent_failures: VecDeque<u64>,
}

/// Owns all per-neighbor and system-wide adaptive state. Writer-owned:
/// every mutator takes `&self` and locks internally (spec §5 "Adaptive
/// performance tables: writer-owned, readers get a snapshot").
pub struct AdaptiveMetrics {
    neighbor_stats: RwLock<HashMap<NodeId, NeighborStats>>,
    fault_patterns: RwLock<HashMap<(NodeId, String), FaultPattern>>,
    load_samples: RwLock<RingBuffer<f64>>,
}

impl AdaptiveMetrics {
    pub fn new() -> Self {
        Self {
            neighbor_stats: RwLock::new(HashMap::new()),
            fault_patterns: RwLock::new(HashMap::new()),
            load_samples: RwLock::new(RingBuffer::new(LOAD_WINDOW)),
        }
    }

    pub fn record_latency(&self, neighbor: &NodeId, latency_ms: f64) {
        let mut guard = self.neighbor_stats.write();
        guard.entry(neighbor.clone()).or_default().latencies().push(latency_ms);
    }

    /// Record a delivery attempt's outcome, updating the neighbor's EMA
    /// of success with `learning_rate` as the smoothing factor.
    pub fn record_delivery(&self, neighbor: &NodeId, success: bool, learning_rate: f64) {
        let mut guard = self.neighbor_stats.write();
        let stats = guard.entry(neighbor.clone()).or_default();
        let sample = if success { 1.0 } else { 0.0 };
        stats.ema_success = if stats.seen_success_sample {
            stats.ema_success + learning_rate * (sample - stats.ema_success)
        } else {
            sample
        };
        stats.seen_success_sample = true;
    }

    /// Record a per-(neighbor, kind) fault sample, used by
    /// `should_forward`'s "route around neighbors with >=3 recent
    /// failures within a 5-minute window" rule.
    pub fn record_fault_sample(
        &self,
        neighbor: &NodeId,
        kind: &str,
        success: bool,
        now: u64,
        learning_rate: f64,
    ) {
        let mut guard = self.fault_patterns.write();
        let pattern = guard
            .entry((neighbor.clone(), kind.to_string()))
            .or_default();
        let sample = if success { 1.0 } else { 0.0 };
        pattern.ema_success = if pattern.seen_success_sample {
            pattern.ema_success + learning_rate * (sample - pattern.ema_success)
        } else {
            sample
        };
        pattern.seen_success_sample = true;
        if !success {
            pattern.last_failure_at = Some(now);
            pattern.recent_failures.push_back(now);
        }
        while let Some(&oldest) = pattern.recent_failures.front() {
            if now.saturating_sub(oldest) > FAULT_WINDOW_SECS {
                pattern.recent_failures.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn recent_failure_count(&self, neighbor: &NodeId, kind: &str, now: u64) -> u32 {
        let guard = self.fault_patterns.read();
        match guard.get(&(neighbor.clone(), kind.to_string())) {
            Some(pattern) => pattern
                .recent_failures
                .iter()
                .filter(|&&t| now.saturating_sub(t) <= FAULT_WINDOW_SECS)
                .count() as u32,
            None => 0,
        }
    }

    /// Mean recent latency, clipped to a 2x cap relative to `baseline_ms`
    /// and expressed as a `[0,1]` penalty (0 = at or below baseline,
    /// 1 = at or beyond the cap). Used by the adaptive energy-decay rule.
    pub fn latency_penalty(&self, neighbor: &NodeId, baseline_ms: f64) -> f64 {
        if baseline_ms <= 0.0 {
            return 0.0;
        }
        let guard = self.neighbor_stats.read();
        let Some(stats) = guard.get(neighbor) else {
            return 0.0;
        };
        let Some(mean) = stats.latencies_ms.as_ref().and_then(RingBuffer::mean) else {
            return 0.0;
        };
        let capped = mean.min(baseline_ms * 2.0);
        ((capped - baseline_ms).max(0.0) / baseline_ms).min(1.0)
    }

    /// `1 - success_rate`, defaulting to 0 (perfectly reliable) absent data
    /// — a conservative default per the "Policy calls must be total" rule.
    pub fn reliability_penalty(&self, neighbor: &NodeId) -> f64 {
        let guard = self.neighbor_stats.read();
        match guard.get(neighbor) {
            Some(stats) if stats.seen_success_sample => 1.0 - stats.ema_success,
            _ => 0.0,
        }
    }

    pub fn network_score(&self, neighbor: &NodeId) -> f64 {
        let guard = self.neighbor_stats.read();
        match guard.get(neighbor) {
            Some(stats) if stats.seen_success_sample => {
                let latency_component = 1.0
                    - stats
                        .latencies_ms
                        .as_ref()
                        .and_then(RingBuffer::mean)
                        .map(|m| (m / 1000.0).min(1.0))
                        .unwrap_or(0.0);
                (0.5 * stats.ema_success + 0.5 * latency_component).clamp(0.0, 1.0)
            }
            _ => 0.5, // conservative neutral default
        }
    }

    pub fn record_load_sample(&self, load: f64) {
        self.load_samples.write().push(load.clamp(0.0, 1.0));
    }

    pub fn current_load(&self) -> f64 {
        self.load_samples.read().mean().unwrap_or(0.0)
    }

    /// Derived trend from the load sample series, bounded to
    /// `{Rising, Falling, Steady}` (spec §4.1).
    pub fn load_trend(&self) -> LoadTrend {
        let guard = self.load_samples.read();
        let n = guard.samples.len();
        if n < 2 {
            return LoadTrend::Steady;
        }
        let half = n / 2;
        let first: f64 = guard.samples.iter().take(half).sum::<f64>() / half as f64;
        let second: f64 =
            guard.samples.iter().skip(n - half).sum::<f64>() / half as f64;
        let delta = second - first;
        if delta > 0.05 {
            LoadTrend::Rising
        } else if delta < -0.05 {
            LoadTrend::Falling
        } else {
            LoadTrend::Steady
        }
    }
}

impl Default for AdaptiveMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(n: &str) -> NodeId {
        NodeId::new(n.to_string())
    }

    #[test]
    fn reliability_penalty_defaults_to_zero_without_data() {
        let m = AdaptiveMetrics::new();
        assert_eq!(m.reliability_penalty(&node("a")), 0.0);
    }

    #[test]
    fn reliability_penalty_tracks_failures() {
        let m = AdaptiveMetrics::new();
        for _ in 0..10 {
            m.record_delivery(&node("a"), false, 0.5);
        }
        assert!(m.reliability_penalty(&node("a")) > 0.9);
    }

    #[test]
    fn latency_penalty_is_capped_at_one() {
        let m = AdaptiveMetrics::new();
        for _ in 0..5 {
            m.record_latency(&node("a"), 10_000.0);
        }
        assert_eq!(m.latency_penalty(&node("a"), 100.0), 1.0);
    }

    #[test]
    fn recent_failure_count_respects_window() {
        let m = AdaptiveMetrics::new();
        m.record_fault_sample(&node("a"), "task", false, 0, 0.5);
        m.record_fault_sample(&node("a"), "task", false, 100, 0.5);
        m.record_fault_sample(&node("a"), "task", false, 200, 0.5);
        assert_eq!(m.recent_failure_count(&node("a"), "task", 250), 3);
        // A failure 10 minutes later should roll the earliest two out.
        m.record_fault_sample(&node("a"), "task", false, 850, 0.5);
        assert_eq!(m.recent_failure_count(&node("a"), "task", 850), 2);
    }

    #[test]
    fn load_trend_detects_rising_and_falling() {
        let m = AdaptiveMetrics::new();
        for v in [0.1, 0.1, 0.1, 0.8, 0.8, 0.8] {
            m.record_load_sample(v);
        }
        assert_eq!(m.load_trend(), LoadTrend::Rising);

        let m2 = AdaptiveMetrics::new();
        for v in [0.8, 0.8, 0.8, 0.1, 0.1, 0.1] {
            m2.record_load_sample(v);
        }
        assert_eq!(m2.load_trend(), LoadTrend::Falling);
    }

    #[test]
    fn ring_buffer_bounded_by_capacity() {
        let m = AdaptiveMetrics::new();
        for i in 0..500 {
            m.record_load_sample(i as f64 / 500.0);
        }
        assert_eq!(m.load_samples.read().samples.len(), LOAD_WINDOW);
    }
}
