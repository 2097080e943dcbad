//! The small admissible-type tagged union for parameter values.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A parameter's value. Intentionally a closed set rather than an open
/// `serde_json::Value` — the control surface's batch-write endpoint needs
/// to reject a malformed write outright (spec §6.2, §7 "Configuration
/// error").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    /// Stored as milliseconds for a stable wire representation.
    DurationMs(u64),
}

impl ParamValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            ParamValue::DurationMs(ms) => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Float(_) => "float",
            ParamValue::Int(_) => "int",
            ParamValue::Bool(_) => "bool",
            ParamValue::DurationMs(_) => "duration",
        }
    }

    pub fn same_kind(&self, other: &ParamValue) -> bool {
        self.kind_name() == other.kind_name()
    }
}

/// Parameter-bag failures. Writes can fail (spec §3.3); reads never do —
/// an absent key is `None`, not an error.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParamsError {
    #[error("parameter '{key}' expects a {expected} value, got {got}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        got: &'static str,
    },
}
