//! HTTP adapter for cluster metadata and produce endpoints.

mod handlers;
mod routes;

pub use handlers::ClusterHandlers;
pub use routes::cluster_routes;
