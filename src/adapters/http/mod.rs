//! HTTP adapters - REST API implementations.
//!
//! Each domain module has its own HTTP adapter for endpoint exposure;
//! [`app_router`] mounts them all.

pub mod cluster;
pub mod consume_session;
pub mod health;
pub mod response;
mod router;

pub use cluster::{cluster_routes, ClusterHandlers};
pub use consume_session::{consume_session_routes, ConsumeSessionHandlers};
pub use response::{ApiResponse, ErrorResponse};
pub use router::app_router;
