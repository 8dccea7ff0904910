//! Cluster inspection and produce use cases.

mod service;

pub use service::ClusterService;
