//! Records persisted by the standalone store.
//!
//! All types are serializable to/from JSON for storage in redb tables.
//! Config maps are stored as [`ConfigResource`](proscale_core::ConfigResource)
//! directly.

use proscale_core::{ScaleTarget, TargetKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Node ───────────────────────────────────────────────────────────

/// A cluster node as seen by the autoscaler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeInfo {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Cordoned nodes accept no new workloads.
    #[serde(default)]
    pub unschedulable: bool,
    #[serde(default = "default_ready")]
    pub ready: bool,
    pub allocatable_cores: u64,
}

fn default_ready() -> bool {
    true
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, allocatable_cores: u64) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            unschedulable: false,
            ready: true,
            allocatable_cores,
        }
    }

    /// Ready and not cordoned.
    pub fn is_schedulable(&self) -> bool {
        self.ready && !self.unschedulable
    }
}

// ── Workload ───────────────────────────────────────────────────────

/// A scalable workload and its current replica count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkloadRecord {
    pub namespace: String,
    pub kind: TargetKind,
    pub name: String,
    pub replicas: u32,
}

impl WorkloadRecord {
    pub fn new(target: &ScaleTarget, replicas: u32) -> Self {
        Self {
            namespace: target.namespace.clone(),
            kind: target.kind.clone(),
            name: target.name.clone(),
            replicas,
        }
    }

    pub fn target(&self) -> ScaleTarget {
        ScaleTarget {
            kind: self.kind.clone(),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }

    /// Composite `{namespace}/{kind}/{name}` key.
    pub fn table_key(&self) -> String {
        format!("{}/{}/{}", self.namespace, self.kind, self.name)
    }
}
