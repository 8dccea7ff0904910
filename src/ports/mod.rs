//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Log Backend Ports
//!
//! - `LogConsumerFactory` / `LogConsumer` - Group consumers with pause/resume
//! - `LogProducer` - Single-record writes
//! - `ClusterAdmin` - Broker/topic metadata and topic creation
//!
//! ## Session Ports
//!
//! - `ConsumptionControl` - Starts and signals per-session consumers
//! - `SessionMessageBroadcaster` - Fan-out of records to live viewers

mod consumption_control;
mod log_backend;
mod message_broadcaster;

pub use consumption_control::{ConsumptionControl, MessageSink};
pub use log_backend::{BackendError, ClusterAdmin, LogConsumer, LogConsumerFactory, LogProducer};
pub use message_broadcaster::{
    CloseCallback, MessageCallback, SessionMessageBroadcaster, SubscriberError,
};
