//! Collaborator trait implementations over the standalone store.

use async_trait::async_trait;
use proscale_core::{
    ClientError, ClientResult, ClusterStatus, ClusterStatusProvider, ConfigData, ConfigResource,
    ConfigStore, NodeSelector, ScaleTarget, ScaleTargetUpdater,
};
use tracing::debug;

use crate::store::StateStore;
use crate::types::NodeInfo;

#[async_trait]
impl ConfigStore for StateStore {
    async fn fetch(&self, namespace: &str, name: &str) -> ClientResult<ConfigResource> {
        self.get_config_map(namespace, name)?
            .ok_or_else(|| ClientError::not_found("configmap", format!("{namespace}/{name}")))
    }

    async fn create(
        &self,
        namespace: &str,
        name: &str,
        data: ConfigData,
    ) -> ClientResult<ConfigResource> {
        Ok(self.create_config_map(namespace, name, data)?)
    }

    async fn update(
        &self,
        namespace: &str,
        name: &str,
        data: ConfigData,
    ) -> ClientResult<ConfigResource> {
        Ok(self.update_config_map(namespace, name, data)?)
    }
}

#[async_trait]
impl ScaleTargetUpdater for StateStore {
    async fn get_replicas(&self, target: &ScaleTarget) -> ClientResult<u32> {
        self.get_workload(target)?
            .map(|w| w.replicas)
            .ok_or_else(|| ClientError::not_found("workload", target.table_key()))
    }

    async fn set_replicas(&self, target: &ScaleTarget, replicas: u32) -> ClientResult<()> {
        self.set_workload_replicas(target, replicas)?;
        Ok(())
    }
}

/// The standalone cluster: a store plus the selector picking which nodes
/// count toward the cluster size.
#[derive(Clone)]
pub struct LocalCluster {
    store: StateStore,
    selector: NodeSelector,
}

impl LocalCluster {
    pub fn new(store: StateStore, selector: NodeSelector) -> Self {
        Self { store, selector }
    }
}

#[async_trait]
impl ClusterStatusProvider for LocalCluster {
    async fn cluster_status(&self) -> ClientResult<ClusterStatus> {
        let mut status = ClusterStatus::default();
        for node in self.store.list_nodes()? {
            if !self.selector.matches(&node.labels) {
                continue;
            }
            status.total_nodes += 1;
            status.total_cores = add_cores(status.total_cores, &node)?;
            if node.is_schedulable() {
                status.schedulable_nodes += 1;
                status.schedulable_cores = add_cores(status.schedulable_cores, &node)?;
            }
        }
        debug!(%status, selector = %self.selector, "computed cluster status");
        Ok(status)
    }
}

fn add_cores(sum: u64, node: &NodeInfo) -> ClientResult<u64> {
    sum.checked_add(node.allocatable_cores).ok_or_else(|| {
        ClientError::Backend(format!(
            "core count overflows at node {} ({} allocatable cores)",
            node.name, node.allocatable_cores
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkloadRecord;
    use proscale_core::TargetKind;

    fn node(name: &str, cores: u64, pool: &str) -> NodeInfo {
        let mut node = NodeInfo::new(name, cores);
        node.labels.insert("pool".to_string(), pool.to_string());
        node
    }

    fn target() -> ScaleTarget {
        ScaleTarget {
            kind: TargetKind::Deployment,
            name: "coredns".to_string(),
            namespace: "kube-system".to_string(),
        }
    }

    #[tokio::test]
    async fn cluster_status_splits_schedulable() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_node(&node("n1", 4, "default")).unwrap();
        let mut cordoned = node("n2", 8, "default");
        cordoned.unschedulable = true;
        store.put_node(&cordoned).unwrap();
        let mut not_ready = node("n3", 2, "default");
        not_ready.ready = false;
        store.put_node(&not_ready).unwrap();

        let cluster = LocalCluster::new(store, NodeSelector::default());
        let status = cluster.cluster_status().await.unwrap();
        assert_eq!(
            status,
            ClusterStatus {
                total_nodes: 3,
                schedulable_nodes: 1,
                total_cores: 14,
                schedulable_cores: 4,
            }
        );
    }

    #[tokio::test]
    async fn cluster_status_honours_selector() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_node(&node("n1", 4, "default")).unwrap();
        store.put_node(&node("n2", 16, "gpu")).unwrap();

        let selector = NodeSelector::parse("pool=gpu").unwrap();
        let cluster = LocalCluster::new(store, selector);
        let status = cluster.cluster_status().await.unwrap();
        assert_eq!(status.total_nodes, 1);
        assert_eq!(status.schedulable_cores, 16);
    }

    #[tokio::test]
    async fn core_overflow_is_an_error() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_node(&NodeInfo::new("huge", u64::MAX)).unwrap();
        store.put_node(&NodeInfo::new("small", 1)).unwrap();

        let cluster = LocalCluster::new(store, NodeSelector::default());
        let err = cluster.cluster_status().await.unwrap_err();
        assert!(matches!(err, ClientError::Backend(ref msg) if msg.contains("overflows")));
    }

    #[tokio::test]
    async fn empty_cluster_is_all_zero() {
        let cluster = LocalCluster::new(StateStore::open_in_memory().unwrap(), NodeSelector::default());
        assert_eq!(cluster.cluster_status().await.unwrap(), ClusterStatus::default());
    }

    #[tokio::test]
    async fn fetch_missing_config_is_not_found() {
        let store = StateStore::open_in_memory().unwrap();
        let err = store.fetch("kube-system", "dns").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn create_existing_config_is_already_exists() {
        let store = StateStore::open_in_memory().unwrap();
        store.create("kube-system", "dns", ConfigData::new()).await.unwrap();
        let err = store
            .create("kube-system", "dns", ConfigData::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn update_replicas_writes_through_store() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_workload(&WorkloadRecord::new(&target(), 1)).unwrap();

        let previous = store.update_replicas(&target(), 4).await.unwrap();
        assert_eq!(previous, 1);
        assert_eq!(store.get_replicas(&target()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn unknown_workload_is_not_found() {
        let store = StateStore::open_in_memory().unwrap();
        let err = store.get_replicas(&target()).await.unwrap_err();
        assert!(err.is_not_found());
        let err = store.set_replicas(&target(), 2).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
