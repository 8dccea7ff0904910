//! Consume-session lifecycle management.
//!
//! - [`ConsumeSessionRegistry`] - Session metadata and bounded buffers
//! - [`ConsumptionEngine`] - One background consumer task per live session
//! - [`ConsumeSessionService`] - Lifecycle rules over the two above
//! - [`IdleSessionSweeper`] - Periodic stop of abandoned sessions

mod engine;
mod idle_sweeper;
mod registry;
mod service;

pub use engine::{ConsumptionEngine, ConsumptionEngineConfig};
pub use idle_sweeper::{IdleSessionSweeper, IdleSweeperConfig, SweepReport};
pub use registry::ConsumeSessionRegistry;
pub use service::{ConsumeSessionService, SessionSettings, StartSessionCommand};
