//! Control-surface response/request shapes (spec §6.2). Kept separate
//! from the wire-level [`ryx_comm`] types since the HTTP surface is a
//! distinct external collaborator with its own encoding conventions
//! (payload as a UTF-8 string on injection, base64 on read-back).

use ryx_discovery::Discovery;
use ryx_spatial::{Barrier, SpatialConfig};
use ryx_types::{Message, Neighbor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: String,
    pub kind: String,
    pub payload: String,
    pub energy: f64,
    pub ttl: u64,
    pub hops: u32,
    pub source: String,
    pub path: Vec<String>,
    pub created_at: u64,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl From<&Message> for MessageView {
    fn from(msg: &Message) -> Self {
        use base64::Engine;
        Self {
            id: msg.id.to_hex(),
            kind: msg.kind.as_str().to_string(),
            payload: base64::engine::general_purpose::STANDARD.encode(&msg.payload),
            energy: msg.energy,
            ttl: msg.ttl,
            hops: msg.hops,
            source: msg.source.to_string(),
            path: msg.path.iter().map(|n| n.to_string()).collect(),
            created_at: msg.created_at,
            metadata: msg.metadata.clone().into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InjectRequest {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub payload: String,
    #[serde(default = "default_energy")]
    pub energy: f64,
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

fn default_kind() -> String {
    "text".to_string()
}

fn default_energy() -> f64 {
    10.0
}

fn default_ttl() -> u64 {
    300
}

#[derive(Debug, Deserialize)]
pub struct TaskInjectRequest {
    #[serde(rename = "type")]
    pub task_type: String,
    /// UTF-8 task input. Binary tasks are out of scope for the HTTP
    /// surface; use the peer wire directly for those.
    pub data: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
    #[serde(default = "default_energy")]
    pub energy: f64,
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub node_id: String,
    pub cluster_tag: String,
    pub uptime_secs: u64,
    pub data_port: u16,
    pub discovery_port: u16,
    pub neighbor_count: usize,
    pub diffusion_stats: ryx_diffusion::StoreStats,
}

#[derive(Debug, Serialize)]
pub struct NeighborView {
    pub node_id: String,
    pub address: String,
    pub port: u16,
    pub zone: Option<String>,
    pub distance: Option<f64>,
}

impl From<&Neighbor> for NeighborView {
    fn from(n: &Neighbor) -> Self {
        Self {
            node_id: n.node_id.to_string(),
            address: n.address.clone(),
            port: n.port,
            zone: n.zone().map(str::to_string),
            distance: n.distance,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TopologyView {
    pub self_id: String,
    pub neighbors: Vec<NeighborView>,
    pub zones: Vec<String>,
    pub barriers: Vec<Barrier>,
}

pub fn topology_view(self_id: &str, discovery: &Discovery, barriers: &[Barrier]) -> TopologyView {
    let neighbors: Vec<Neighbor> = discovery.all_neighbors();
    let mut zones: Vec<String> = neighbors.iter().filter_map(|n| n.zone().map(str::to_string)).collect();
    zones.sort();
    zones.dedup();
    TopologyView {
        self_id: self_id.to_string(),
        neighbors: neighbors.iter().map(NeighborView::from).collect(),
        zones,
        barriers: barriers.to_vec(),
    }
}

#[derive(Debug, Deserialize)]
pub struct DistanceRequest {
    pub config: SpatialConfig,
}

#[derive(Debug, Serialize)]
pub struct DistanceResponse {
    pub distance: Option<f64>,
}
