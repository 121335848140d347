//! Linear policy — replicas proportional to cluster size.
//!
//! ```json
//! {
//!   "coresPerReplica": 256,
//!   "nodesPerReplica": 16,
//!   "min": 1,
//!   "max": 100,
//!   "preventSinglePointFailure": true,
//!   "includeUnschedulableNodes": false
//! }
//! ```

use proscale_core::ClusterStatus;
use serde::Deserialize;
use tracing::debug;

use crate::error::{PolicyError, PolicyResult};
use crate::policy::PolicyKind;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLinearParams {
    #[serde(default)]
    cores_per_replica: f64,
    #[serde(default)]
    nodes_per_replica: f64,
    #[serde(default)]
    min: i64,
    #[serde(default)]
    max: i64,
    #[serde(default)]
    prevent_single_point_failure: bool,
    #[serde(default)]
    include_unschedulable_nodes: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearPolicy {
    cores_per_replica: f64,
    nodes_per_replica: f64,
    min: u32,
    /// `None` leaves the count unbounded above.
    max: Option<u32>,
    prevent_single_point_failure: bool,
    include_unschedulable_nodes: bool,
}

impl LinearPolicy {
    /// Parse and validate linear params from their JSON form.
    pub fn parse(data: &str) -> PolicyResult<Self> {
        let raw: RawLinearParams = serde_json::from_str(data).map_err(|e| {
            PolicyError::invalid(PolicyKind::Linear, format!("could not parse parameters ({e})"))
        })?;

        let invalid = |reason: String| PolicyError::invalid(PolicyKind::Linear, reason);

        let min = match raw.min {
            m if m < 0 => return Err(invalid(format!("invalid negative value for min: {m}"))),
            0 => {
                debug!("defaulting min replicas count to 1 for linear policy");
                1
            }
            m => u32::try_from(m).map_err(|_| invalid(format!("min out of range: {m}")))?,
        };
        let max = match raw.max {
            m if m < 0 => return Err(invalid(format!("invalid negative value for max: {m}"))),
            0 => None,
            m => Some(u32::try_from(m).map_err(|_| invalid(format!("max out of range: {m}")))?),
        };
        if let Some(max) = max
            && max < min
        {
            return Err(invalid(format!(
                "max replicas count {max} should be greater than or equal to min replicas count {min}"
            )));
        }
        if raw.cores_per_replica < 0.0 || !raw.cores_per_replica.is_finite() {
            return Err(invalid(format!(
                "invalid value for coresPerReplica: {}",
                raw.cores_per_replica
            )));
        }
        if raw.nodes_per_replica < 0.0 || !raw.nodes_per_replica.is_finite() {
            return Err(invalid(format!(
                "invalid value for nodesPerReplica: {}",
                raw.nodes_per_replica
            )));
        }
        if raw.cores_per_replica == 0.0 && raw.nodes_per_replica == 0.0 {
            return Err(invalid(
                "should at least provide either coresPerReplica or nodesPerReplica (greater than 0)"
                    .to_string(),
            ));
        }

        let policy = Self {
            cores_per_replica: raw.cores_per_replica,
            nodes_per_replica: raw.nodes_per_replica,
            min,
            max,
            prevent_single_point_failure: raw.prevent_single_point_failure,
            include_unschedulable_nodes: raw.include_unschedulable_nodes,
        };
        debug!(?policy, "parsed linear params");
        Ok(policy)
    }

    pub fn cores_per_replica(&self) -> f64 {
        self.cores_per_replica
    }

    pub fn nodes_per_replica(&self) -> f64 {
        self.nodes_per_replica
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> Option<u32> {
        self.max
    }

    pub fn prevent_single_point_failure(&self) -> bool {
        self.prevent_single_point_failure
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
        let from_cores = self.replicas_for(cores, self.cores_per_replica);
        let from_nodes = self.replicas_for(nodes, self.nodes_per_replica);

        // A dimension that lands on a single replica lifts the floor to two.
        let floor = if self.prevent_single_point_failure && (from_cores == 1 || from_nodes == 1) {
            2
        } else {
            1
        };
        from_cores.max(from_nodes).max(floor)
    }

    /// `ceil(resources / per_replica)` clamped to `[min, max]`.
    ///
    /// A zero ratio leaves the dimension out, contributing exactly 1.
    fn replicas_for(&self, resources: u64, per_replica: f64) -> u32 {
        if per_replica == 0.0 {
            return 1;
        }
        let mut replicas = (resources as f64 / per_replica).ceil();
        if let Some(max) = self.max {
            replicas = replicas.min(f64::from(max));
        }
        // Float to int casts saturate, so a huge ratio result caps at u32::MAX.
        (replicas as u32).max(self.min)
    }
}
