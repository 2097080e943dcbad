//! Process boundary (spec §6.3): CLI flags plus an optional TOML overlay
//! for parameter-bag defaults. Validation failures here are fatal at
//! startup per the configuration-error row of the error taxonomy (§7).

use clap::Parser;
use ryx_discovery::AnnounceTargets;
use ryx_params::ParamValue;
use ryx_spatial::{Barrier, BarrierType, CoordSystem, IsolationClass, SpatialConfig};
use ryx_types::{ClusterTag, NodeId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid coordinate system '{0}', expected one of gps, relative, logical, none")]
    UnknownCoordSystem(String),
    #[error("malformed barrier descriptor '{0}', expected type:zoneA:zoneB:isolation")]
    MalformedBarrier(String),
    #[error("unknown barrier type '{0}'")]
    UnknownBarrierType(String),
    #[error("unknown isolation class '{0}'")]
    UnknownIsolationClass(String),
    #[error("invalid spatial configuration: {0}")]
    Spatial(#[from] ryx_spatial::SpatialError),
    #[error("failed to read config file {path}: {source}")]
    ConfigFileRead { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    ConfigFileParse { path: PathBuf, source: toml::de::Error },
    #[error("malformed seed address '{0}'")]
    MalformedSeedAddress(String),
}

/// `ryx-node` process arguments (spec §6.3).
#[derive(Debug, Parser)]
#[command(name = "ryx-node", about = "A Ryx diffusion node")]
pub struct NodeArgs {
    /// Datagram port for peer-to-peer traffic. The discovery listener binds
    /// data_port + 1000.
    #[arg(long, default_value_t = 9000)]
    pub data_port: u16,

    /// HTTP control surface port.
    #[arg(long, default_value_t = 8080)]
    pub control_port: u16,

    /// Cluster tag; announcements from a different tag are ignored.
    #[arg(long, default_value = "default")]
    pub cluster_tag: String,

    /// Stable node identifier. Auto-generated (short hex) if absent.
    #[arg(long)]
    pub node_id: Option<String>,

    /// Coordinate system: gps, relative, logical, or none.
    #[arg(long, default_value = "none")]
    pub coord_system: String,

    #[arg(long)]
    pub x: Option<f64>,
    #[arg(long)]
    pub y: Option<f64>,
    #[arg(long)]
    pub z: Option<f64>,
    #[arg(long)]
    pub zone: Option<String>,

    /// Comma-separated barrier descriptors: "type:zoneA:zoneB:isolation",
    /// e.g. "firewall:bridge:engine_bay:security".
    #[arg(long)]
    pub barriers: Option<String>,

    /// Comma-separated fixed announce targets (host:port), replacing the
    /// loopback port-scan dev convenience for real deployments.
    #[arg(long)]
    pub seeds: Option<String>,

    /// Optional TOML file overlaying parameter-bag defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub struct NodeConfig {
    pub self_id: NodeId,
    pub cluster_tag: ClusterTag,
    pub data_port: u16,
    pub control_port: u16,
    pub spatial: SpatialConfig,
    pub barriers: Vec<Barrier>,
    pub announce_targets: AnnounceTargets,
    pub param_overrides: HashMap<String, ParamValue>,
}

fn parse_coord_system(raw: &str) -> Result<CoordSystem, ConfigError> {
    match raw {
        "gps" => Ok(CoordSystem::Gps),
        "relative" => Ok(CoordSystem::Relative),
        "logical" => Ok(CoordSystem::Logical),
        "none" => Ok(CoordSystem::None),
        other => Err(ConfigError::UnknownCoordSystem(other.to_string())),
    }
}

fn parse_barrier_type(raw: &str) -> Result<BarrierType, ConfigError> {
    match raw {
        "bulkhead" => Ok(BarrierType::Bulkhead),
        "firewall" => Ok(BarrierType::Firewall),
        "zone" => Ok(BarrierType::Zone),
        "distance" => Ok(BarrierType::Distance),
        other => Err(ConfigError::UnknownBarrierType(other.to_string())),
    }
}

fn parse_isolation_class(raw: &str) -> Result<IsolationClass, ConfigError> {
    match raw {
        "fault" => Ok(IsolationClass::Fault),
        "maintenance" => Ok(IsolationClass::Maintenance),
        "security" => Ok(IsolationClass::Security),
        "emergency" => Ok(IsolationClass::Emergency),
        other => Err(ConfigError::UnknownIsolationClass(other.to_string())),
    }
}

fn parse_barrier_descriptor(index: usize, raw: &str) -> Result<Barrier, ConfigError> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [kind, zone_a, zone_b, isolation] = parts.as_slice() else {
        return Err(ConfigError::MalformedBarrier(raw.to_string()));
    };
    Ok(Barrier::new(
        format!("cli-barrier-{index}"),
        parse_barrier_type(kind)?,
        zone_a.to_string(),
        zone_b.to_string(),
        parse_isolation_class(isolation)?,
    ))
}

fn parse_barriers(raw: &str) -> Result<Vec<Barrier>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, s)| parse_barrier_descriptor(i, s))
        .collect()
}

fn parse_seeds(raw: &str) -> Result<Vec<SocketAddr>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(|_| ConfigError::MalformedSeedAddress(s.to_string())))
        .collect()
}

/// Overlay parameter-bag defaults from a TOML file (`[parameters]` table
/// of floats, ints, bools, or `{ duration_ms = N }`) without requiring
/// the operator to pass every knob on the command line.
fn load_param_overrides(path: &PathBuf) -> Result<HashMap<String, ParamValue>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileRead { path: path.clone(), source })?;
    let parsed: toml::Value = toml::from_str(&raw).map_err(|source| ConfigError::ConfigFileParse { path: path.clone(), source })?;

    let mut overrides = HashMap::new();
    let Some(table) = parsed.get("parameters").and_then(|v| v.as_table()) else {
        return Ok(overrides);
    };
    for (key, value) in table {
        let param = match value {
            toml::Value::Float(f) => ParamValue::Float(*f),
            toml::Value::Integer(i) => ParamValue::Int(*i),
            toml::Value::Boolean(b) => ParamValue::Bool(*b),
            toml::Value::Table(t) => match t.get("duration_ms").and_then(|v| v.as_integer()) {
                Some(ms) => ParamValue::DurationMs(ms.max(0) as u64),
                None => continue,
            },
            _ => continue,
        };
        overrides.insert(key.clone(), param);
    }
    Ok(overrides)
}

impl NodeConfig {
    pub fn from_args(args: NodeArgs) -> Result<Self, ConfigError> {
        let spatial = SpatialConfig {
            system: parse_coord_system(&args.coord_system)?,
            x: args.x,
            y: args.y,
            z: args.z,
            zone: args.zone,
        };
        spatial.validate()?;

        let barriers = args.barriers.as_deref().map(parse_barriers).transpose()?.unwrap_or_default();

        let announce_targets = match args.seeds.as_deref() {
            Some(raw) => AnnounceTargets::Fixed(parse_seeds(raw)?),
            None => AnnounceTargets::default_dev(),
        };

        let param_overrides = args.config.as_ref().map(load_param_overrides).transpose()?.unwrap_or_default();

        Ok(Self {
            self_id: args.node_id.map(NodeId::new).unwrap_or_else(NodeId::generate),
            cluster_tag: ClusterTag::new(args.cluster_tag),
            data_port: args.data_port,
            control_port: args.control_port,
            spatial,
            barriers,
            announce_targets,
            param_overrides,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_barrier_descriptor() {
        let barriers = parse_barriers("firewall:bridge:engine_bay:security").unwrap();
        assert_eq!(barriers.len(), 1);
        assert_eq!(barriers[0].barrier_type, BarrierType::Firewall);
        assert_eq!(barriers[0].isolation, IsolationClass::Security);
    }

    #[test]
    fn parses_multiple_comma_separated_barriers() {
        let barriers = parse_barriers("zone:a:b:maintenance, bulkhead:c:d:fault").unwrap();
        assert_eq!(barriers.len(), 2);
    }

    #[test]
    fn rejects_malformed_barrier_descriptor() {
        assert!(parse_barriers("firewall:bridge:engine_bay").is_err());
    }

    #[test]
    fn rejects_unknown_coord_system() {
        assert!(parse_coord_system("warp").is_err());
    }

    #[test]
    fn seeds_parse_into_socket_addrs() {
        let seeds = parse_seeds("10.0.0.1:9000, 10.0.0.2:9000").unwrap();
        assert_eq!(seeds.len(), 2);
    }

    #[test]
    fn node_config_generates_id_when_absent() {
        let args = NodeArgs {
            data_port: 9000,
            control_port: 8080,
            cluster_tag: "default".into(),
            node_id: None,
            coord_system: "none".into(),
            x: None,
            y: None,
            z: None,
            zone: None,
            barriers: None,
            seeds: None,
            config: None,
        };
        let cfg = NodeConfig::from_args(args).unwrap();
        assert_eq!(cfg.self_id.as_str().len(), 16);
    }
}
