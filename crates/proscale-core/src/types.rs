//! Domain types shared by every proscale crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Point-in-time view of cluster size, recomputed on every poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    pub total_nodes: u64,
    pub schedulable_nodes: u64,
    pub total_cores: u64,
    pub schedulable_cores: u64,
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nodes {}/{} schedulable, cores {}/{} schedulable",
            self.schedulable_nodes, self.total_nodes, self.schedulable_cores, self.total_cores
        )
    }
}

/// Key-value payload of a configuration resource.
///
/// Each key names a policy variant; the value is that variant's JSON
/// parameters as a string.
pub type ConfigData = BTreeMap<String, String>;

/// A configuration resource as returned by the config store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResource {
    pub namespace: String,
    pub name: String,
    pub data: ConfigData,
    /// Opaque revision token. Only ever compared for equality.
    pub version: String,
}

impl ConfigResource {
    /// Build the composite `{namespace}/{name}` key.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Label selector restricting which nodes count toward the cluster size.
///
/// Parsed from `key=value,key2=value2`; a node matches when it carries
/// every listed pair. The empty selector matches all nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSelector {
    requirements: BTreeMap<String, String>,
}

impl NodeSelector {
    /// Parse a comma-separated `key=value` list.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut requirements = BTreeMap::new();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(format!("invalid label requirement {pair:?}, expected key=value"));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("empty label key in {pair:?}"));
            }
            requirements.insert(key.to_string(), value.trim().to_string());
        }
        Ok(Self { requirements })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Whether a node with the given labels satisfies the selector.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|have| have == v))
    }
}

impl fmt::Display for NodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .requirements
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        f.write_str(&pairs.join(","))
    }
}
