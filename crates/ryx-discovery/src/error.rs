use thiserror::Error;

/// Internal to admission processing; never surfaced past the service
/// boundary. A malformed announcement is dropped silently per spec §4.2
/// ("malformed announcements are discarded silently") — this type exists
/// so the drop reason is visible in a debug log, not to propagate an
/// error to a caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("self-announcement")]
    SelfAnnouncement,
    #[error("cluster tag mismatch: expected {expected}, got {got}")]
    ClusterMismatch { expected: String, got: String },
    #[error("unrecognized coordinate system tag: {0}")]
    UnknownCoordSystem(String),
}
