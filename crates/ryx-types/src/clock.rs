//! Time abstraction.
//!
//! Every component that reads time does so through a `dyn Clock` rather
//! than `SystemTime::now()` directly, so tests can advance time
//! deterministically. Grounded in the teacher's `TimeSource` port
//! (`qc-01-peer-discovery::ports::TimeSource`) and its
//! `ControllableTimeSource` test double.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns wall-clock time and a monotonically increasing tick counter.
///
/// The tick counter stands in for `last_seen`-style monotonic instants:
/// plain `u64` ticks rather than `std::time::Instant` so that it stays
/// `Send + Sync + Copy` and serializable for observability snapshots.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_unix(&self) -> u64;

    /// Monotonically non-decreasing tick, used for staleness comparisons.
    fn monotonic(&self) -> u64 {
        self.now_unix()
    }
}

/// Real wall-clock time source used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Test-only clock implementations, kept public (not `#[cfg(test)]`) so
/// downstream crates can use them in their own test modules.
pub mod test_support {
    use super::Clock;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Thread-safe controllable clock for deterministic tests.
    pub struct ControllableClock {
        now: AtomicU64,
    }

    impl ControllableClock {
        pub fn new(start: u64) -> Self {
            Self {
                now: AtomicU64::new(start),
            }
        }

        pub fn advance(&self, secs: u64) {
            self.now.fetch_add(secs, Ordering::SeqCst);
        }

        pub fn set(&self, value: u64) {
            self.now.store(value, Ordering::SeqCst);
        }
    }

    impl Clock for ControllableClock {
        fn now_unix(&self) -> u64 {
            self.now.load(Ordering::SeqCst)
        }
    }
}
