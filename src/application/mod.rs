//! Application layer - Use cases orchestrating domain types and ports.
//!
//! - `consume_session` - Consume-session lifecycle, consumption and sweeps
//! - `cluster` - Cluster metadata, produce and topic bootstrap

pub mod cluster;
pub mod consume_session;

pub use cluster::ClusterService;
pub use consume_session::{
    ConsumeSessionRegistry, ConsumeSessionService, ConsumptionEngine, ConsumptionEngineConfig,
    IdleSessionSweeper, IdleSweeperConfig, SessionSettings, StartSessionCommand,
};
