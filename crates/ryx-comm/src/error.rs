use thiserror::Error;

/// Transient I/O errors (spec §7): recorded in the adaptive layer's
/// per-neighbor performance counters, never propagated as fatal.
#[derive(Debug, Error)]
pub enum CommError {
    #[error("socket send failed: {0}")]
    Send(#[source] std::io::Error),

    #[error("socket bind failed: {0}")]
    Bind(#[source] std::io::Error),

    #[error("send timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}
