//! Cluster and broker metadata.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerInfo {
    pub id: i32,
    pub host: String,
    pub port: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    pub cluster_id: Option<String>,
    pub brokers: Vec<BrokerInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_cluster_id_in_camel_case() {
        let info = ClusterInfo {
            cluster_id: Some("abc".to_string()),
            brokers: vec![BrokerInfo {
                id: 1,
                host: "localhost".to_string(),
                port: 9092,
            }],
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["clusterId"], "abc");
        assert_eq!(json["brokers"][0]["port"], 9092);
    }
}
