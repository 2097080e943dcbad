//! # Behavior / Policy
//!
//! The self-modification mechanism (spec §4.1): a set of total functions
//! data-plane components call at decision points, parameterized by
//! [`ryx_params::Parameters`] and per-neighbor adaptive history.
//!
//! Grounded in the teacher's separation of pure domain services
//! (`qc-05-block-propagation::domain::services`) from the stateful layer
//! that owns adaptive state — here, [`metrics::AdaptiveMetrics`].
//! Policy calls never fail (spec §4.1 "Policy calls must be total"): every
//! function here returns a plain value, with a conservative default when
//! data is missing.

mod metrics;
mod policy;

pub use metrics::{AdaptiveMetrics, LoadTrend};
pub use policy::{EvictReason, Policy};
