//! Self-announcement target resolution (spec §4.2, §9).
//!
//! The source floods a fixed range of loopback discovery ports — a
//! development convenience the design notes call out as something "must
//! be replaceable by a configured broadcast/multicast address or a seed
//! list" without touching the emission logic itself. [`AnnounceTargets`]
//! is the seam: [`Discovery`](crate::service::Discovery) only ever asks
//! it for the current target list.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default loopback discovery port range used by the bundled dev
/// convenience (spec §9: "the broadcast port range [10000, 10020) is a
/// localhost-loopback testing hack").
pub const DEFAULT_PORT_SCAN_START: u16 = 10_000;
pub const DEFAULT_PORT_SCAN_COUNT: u16 = 20;

#[derive(Debug, Clone)]
pub enum AnnounceTargets {
    /// Scan a small range of loopback ports. Local development only.
    LoopbackPortScan { start: u16, count: u16 },
    /// A fixed, operator-supplied set of endpoints (broadcast, multicast,
    /// or seed list) — the real-deployment replacement named in spec §9.
    Fixed(Vec<SocketAddr>),
}

impl AnnounceTargets {
    pub fn default_dev() -> Self {
        AnnounceTargets::LoopbackPortScan {
            start: DEFAULT_PORT_SCAN_START,
            count: DEFAULT_PORT_SCAN_COUNT,
        }
    }

    pub fn resolve(&self) -> Vec<SocketAddr> {
        match self {
            AnnounceTargets::LoopbackPortScan { start, count } => (*start..start + count)
                .map(|port| SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port))
                .collect(),
            AnnounceTargets::Fixed(addrs) => addrs.clone(),
        }
    }
}

/// A node's own discovery-listen port, deterministically derived from its
/// data port (spec §4.2: "derived deterministically from its data port,
/// e.g. data_port + 1000").
pub fn discovery_port(data_port: u16) -> u16 {
    data_port.saturating_add(1000)
}
