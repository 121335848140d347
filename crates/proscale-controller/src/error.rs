use proscale_core::{ClientError, ScaleTarget};
use proscale_policy::PolicyError;
use thiserror::Error;

/// Why a single poll attempt failed. Never fatal by itself.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to get cluster status: {0}")]
    ClusterStatusUnavailable(#[source] ClientError),

    #[error("failed to fetch configmap {namespace}/{name}: {source}")]
    ConfigFetchFailed {
        namespace: String,
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to create configmap {namespace}/{name}: {source}")]
    ConfigCreateFailed {
        namespace: String,
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to sync scaling policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("failed to update replicas of {target}: {source}")]
    ScaleUpdateFailed {
        target: ScaleTarget,
        #[source]
        source: ClientError,
    },
}

/// Why the loop stopped on its own.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("reached {failures} consecutive sync failures")]
    SyncFailureThresholdReached { failures: u32 },
}
