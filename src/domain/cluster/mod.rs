//! Cluster-facing value types: broker/topic metadata and produce records.

mod cluster_info;
mod errors;
mod produce;
mod topic;

pub use cluster_info::{BrokerInfo, ClusterInfo};
pub use errors::ClusterError;
pub use produce::{ProduceRequest, ProduceResponse};
pub use topic::{TopicInfo, TopicSpec};
