//! Diffusion: energy-bounded epidemic propagation of content-addressed
//! messages across the neighbor overlay (spec §4.4), loosely grounded in
//! `qc-05-block-propagation`'s gossip fanout/dedup idiom but concrete
//! rather than port-generic, consistent with the rest of this workspace.

mod eligibility;
mod error;
mod executor;
mod service;
mod store;

pub use eligibility::is_eligible;
pub use error::DiffusionError;
pub use executor::{ExecutorError, Task, TaskExecutor, TaskRegistry};
pub use service::Diffusion;
pub use store::{MessageStore, StoreStats};
