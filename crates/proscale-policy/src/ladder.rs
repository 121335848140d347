//! Ladder policy — step function over threshold tables.
//!
//! ```json
//! {
//!   "coresToReplicas": [[1, 1], [64, 3], [512, 5]],
//!   "nodesToReplicas": [[1, 1], [2, 2]],
//!   "includeUnschedulableNodes": false
//! }
//! ```
//!
//! Each table maps a resource count to a replica count. A lookup picks
//! the last entry whose threshold does not exceed the current count; the
//! result is the larger of the cores and nodes lookups.

use proscale_core::ClusterStatus;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PolicyError, PolicyResult};
use crate::policy::PolicyKind;

/// One `(threshold, replicas)` step of a ladder table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LadderEntry {
    pub threshold: u64,
    pub replicas: u32,
}

impl From<(u64, u32)> for LadderEntry {
    fn from((threshold, replicas): (u64, u32)) -> Self {
        Self {
            threshold,
            replicas,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLadderParams {
    cores_to_replicas: Option<Vec<Vec<i64>>>,
    nodes_to_replicas: Option<Vec<Vec<i64>>>,
    #[serde(default)]
    include_unschedulable_nodes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LadderPolicy {
    cores_to_replicas: Vec<LadderEntry>,
    nodes_to_replicas: Vec<LadderEntry>,
    include_unschedulable_nodes: bool,
}

impl LadderPolicy {
    /// Build a policy from entries in any order.
    pub fn new(
        cores_to_replicas: impl IntoIterator<Item = LadderEntry>,
        nodes_to_replicas: impl IntoIterator<Item = LadderEntry>,
        include_unschedulable_nodes: bool,
    ) -> Self {
        let mut cores_to_replicas: Vec<_> = cores_to_replicas.into_iter().collect();
        let mut nodes_to_replicas: Vec<_> = nodes_to_replicas.into_iter().collect();
        cores_to_replicas.sort_by_key(|e| e.threshold);
        nodes_to_replicas.sort_by_key(|e| e.threshold);
        Self {
            cores_to_replicas,
            nodes_to_replicas,
            include_unschedulable_nodes,
        }
    }

    /// Parse and validate ladder params from their JSON form.
    pub fn parse(data: &str) -> PolicyResult<Self> {
        let raw: RawLadderParams = serde_json::from_str(data).map_err(|e| {
            PolicyError::invalid(PolicyKind::Ladder, format!("could not parse parameters ({e})"))
        })?;

        let cores = parse_entries(raw.cores_to_replicas.unwrap_or_default(), "coresToReplicas")?;
        let nodes = parse_entries(raw.nodes_to_replicas.unwrap_or_default(), "nodesToReplicas")?;
        let policy = Self::new(cores, nodes, raw.include_unschedulable_nodes);

        for (table, entries) in [
            ("coresToReplicas", &policy.cores_to_replicas),
            ("nodesToReplicas", &policy.nodes_to_replicas),
        ] {
            if let Some(pair) = entries.windows(2).find(|w| w[0].threshold == w[1].threshold) {
                return Err(PolicyError::invalid(
                    PolicyKind::Ladder,
                    format!("duplicate threshold {} in {table}", pair[0].threshold),
                ));
            }
            if entries.windows(2).any(|w| w[1].replicas < w[0].replicas) {
                warn!(table, "ladder replicas decrease as the threshold grows");
            }
        }

        debug!(
            cores_steps = policy.cores_to_replicas.len(),
            nodes_steps = policy.nodes_to_replicas.len(),
            include_unschedulable_nodes = policy.include_unschedulable_nodes,
            "parsed ladder params"
        );
        Ok(policy)
    }

    pub fn cores_to_replicas(&self) -> &[LadderEntry] {
        &self.cores_to_replicas
    }

    pub fn nodes_to_replicas(&self) -> &[LadderEntry] {
        &self.nodes_to_replicas
    }

    pub fn include_unschedulable_nodes(&self) -> bool {
        self.include_unschedulable_nodes
    }

    pub fn expected_replicas(&self, status: &ClusterStatus) -> u32 {
        let (nodes, cores) = if self.include_unschedulable_nodes {
            (status.total_nodes, status.total_cores)
        } else {
            (status.schedulable_nodes, status.schedulable_cores)
        };
        self.expected_replicas_for(nodes, cores)
    }

    fn expected_replicas_for(&self, nodes: u64, cores: u64) -> u32 {
        let from_cores = lookup(&self.cores_to_replicas, cores);
        let from_nodes = lookup(&self.nodes_to_replicas, nodes);
        from_cores.max(from_nodes)
    }
}

/// Replicas for `value` in a table sorted by threshold.
///
/// An empty table yields 1. A value below the lowest threshold takes the
/// first entry.
pub fn lookup(entries: &[LadderEntry], value: u64) -> u32 {
    let Some(first) = entries.first() else {
        return 1;
    };
    match entries.partition_point(|e| e.threshold <= value) {
        0 => first.replicas,
        pos => entries[pos - 1].replicas,
    }
}

fn parse_entries(raw: Vec<Vec<i64>>, table: &str) -> PolicyResult<Vec<LadderEntry>> {
    raw.into_iter()
        .map(|pair| {
            let [threshold, replicas] = pair[..] else {
                return Err(PolicyError::invalid(
                    PolicyKind::Ladder,
                    format!("invalid element {pair:?} in {table}, expected [threshold, replicas]"),
                ));
            };
            let threshold = u64::try_from(threshold);
            let replicas = u32::try_from(replicas);
            match (threshold, replicas) {
                (Ok(threshold), Ok(replicas)) => Ok(LadderEntry {
                    threshold,
                    replicas,
                }),
                _ => Err(PolicyError::invalid(
                    PolicyKind::Ladder,
                    format!("invalid negative or out of range values in entry {pair:?} in {table}"),
                )),
            }
        })
        .collect()
}
