//! Wires the lower `ryx-*` crates into a runnable peer (spec §9): CLI/config
//! parsing, the node's long-lived task set, and the HTTP control surface.

pub mod config;
pub mod demos;
pub mod error;
pub mod http;
pub mod node;

pub use config::{ConfigError, NodeArgs, NodeConfig};
pub use node::Node;
