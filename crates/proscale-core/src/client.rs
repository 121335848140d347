//! Async interfaces to the systems the autoscaler talks to.
//!
//! The reconciliation loop only ever sees these traits. `proscale-state`
//! provides a redb-backed implementation of all three; tests plug in
//! their own fakes.

use async_trait::async_trait;
use tracing::info;

use crate::error::ClientResult;
use crate::target::ScaleTarget;
use crate::types::{ClusterStatus, ConfigData, ConfigResource};

/// Supplies the current node and core counts.
#[async_trait]
pub trait ClusterStatusProvider: Send + Sync {
    async fn cluster_status(&self) -> ClientResult<ClusterStatus>;
}

/// Named key-value configuration resources with a version token.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch a resource. Missing resources yield `ClientError::NotFound`.
    async fn fetch(&self, namespace: &str, name: &str) -> ClientResult<ConfigResource>;

    /// Create a resource. Existing resources yield `ClientError::AlreadyExists`.
    async fn create(
        &self,
        namespace: &str,
        name: &str,
        data: ConfigData,
    ) -> ClientResult<ConfigResource>;

    /// Replace the data of an existing resource, producing a new version.
    async fn update(
        &self,
        namespace: &str,
        name: &str,
        data: ConfigData,
    ) -> ClientResult<ConfigResource>;
}

/// Reads and writes the replica count of workloads.
#[async_trait]
pub trait ScaleTargetUpdater: Send + Sync {
    async fn get_replicas(&self, target: &ScaleTarget) -> ClientResult<u32>;

    async fn set_replicas(&self, target: &ScaleTarget, replicas: u32) -> ClientResult<()>;

    /// Bring `target` to `expected` replicas and return the previous count.
    ///
    /// Writes only when the current count differs.
    async fn update_replicas(&self, target: &ScaleTarget, expected: u32) -> ClientResult<u32> {
        let previous = self.get_replicas(target).await?;
        if previous != expected {
            info!(
                %target,
                namespace = %target.namespace,
                from = previous,
                to = expected,
                "replicas are not as expected, updating"
            );
            self.set_replicas(target, expected).await?;
        }
        Ok(previous)
    }
}
