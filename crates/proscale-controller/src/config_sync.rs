//! Fetch the scaling configuration, seeding it from defaults when absent.

use proscale_core::{ConfigData, ConfigResource, ConfigStore};
use tracing::{debug, info};

use crate::error::ReconcileError;

/// Fetch `namespace/name` from `store`.
///
/// A missing resource is created from `defaults` when they are non-empty.
/// Any other fetch error propagates without a create attempt.
pub async fn sync_config(
    store: &dyn ConfigStore,
    namespace: &str,
    name: &str,
    defaults: Option<&ConfigData>,
) -> Result<ConfigResource, ReconcileError> {
    let fetch_failed = |source| ReconcileError::ConfigFetchFailed {
        namespace: namespace.to_string(),
        name: name.to_string(),
        source,
    };

    match store.fetch(namespace, name).await {
        Ok(config) => {
            debug!(version = %config.version, "fetched configmap");
            Ok(config)
        }
        Err(e) if e.is_not_found() => {
            let Some(defaults) = defaults.filter(|d| !d.is_empty()) else {
                return Err(fetch_failed(e));
            };
            info!(%namespace, %name, "configmap not found, creating it from default params");
            let created = store
                .create(namespace, name, defaults.clone())
                .await
                .map_err(|source| ReconcileError::ConfigCreateFailed {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    source,
                })?;
            info!(version = %created.version, "created configmap");
            Ok(created)
        }
        Err(e) => Err(fetch_failed(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use proscale_core::{ClientError, ClientResult};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        existing: Mutex<Option<ConfigResource>>,
        unavailable: bool,
        reject_create: bool,
        creates: Mutex<u32>,
    }

    #[async_trait]
    impl ConfigStore for FakeStore {
        async fn fetch(&self, namespace: &str, name: &str) -> ClientResult<ConfigResource> {
            if self.unavailable {
                return Err(ClientError::Unavailable("connection refused".to_string()));
            }
            self.existing
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ClientError::not_found("configmap", format!("{namespace}/{name}")))
        }

        async fn create(
            &self,
            namespace: &str,
            name: &str,
            data: ConfigData,
        ) -> ClientResult<ConfigResource> {
            *self.creates.lock().unwrap() += 1;
            if self.reject_create {
                return Err(ClientError::Backend("forbidden".to_string()));
            }
            let created = ConfigResource {
                namespace: namespace.to_string(),
                name: name.to_string(),
                data,
                version: "7".to_string(),
            };
            *self.existing.lock().unwrap() = Some(created.clone());
            Ok(created)
        }

        async fn update(
            &self,
            _namespace: &str,
            _name: &str,
            _data: ConfigData,
        ) -> ClientResult<ConfigResource> {
            unimplemented!("not used by config sync")
        }
    }

    fn defaults() -> ConfigData {
        ConfigData::from([("linear".to_string(), r#"{"coresPerReplica":2}"#.to_string())])
    }

    #[tokio::test]
    async fn existing_config_is_returned_as_is() {
        let store = FakeStore::default();
        let existing = ConfigResource {
            namespace: "kube-system".to_string(),
            name: "dns".to_string(),
            data: ConfigData::new(),
            version: "3".to_string(),
        };
        *store.existing.lock().unwrap() = Some(existing.clone());

        let got = sync_config(&store, "kube-system", "dns", Some(&defaults()))
            .await
            .unwrap();
        assert_eq!(got, existing);
        assert_eq!(*store.creates.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_config_created_from_defaults() {
        let store = FakeStore::default();
        let got = sync_config(&store, "kube-system", "dns", Some(&defaults()))
            .await
            .unwrap();
        assert_eq!(got.version, "7");
        assert_eq!(got.data, defaults());
        assert_eq!(*store.creates.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_config_without_defaults_fails_fetch() {
        let store = FakeStore::default();
        for defaults in [None, Some(&ConfigData::new())] {
            let err = sync_config(&store, "kube-system", "dns", defaults)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ReconcileError::ConfigFetchFailed { ref source, .. } if source.is_not_found()
            ));
        }
        assert_eq!(*store.creates.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn other_fetch_errors_skip_create() {
        let store = FakeStore {
            unavailable: true,
            ..FakeStore::default()
        };
        let err = sync_config(&store, "kube-system", "dns", Some(&defaults()))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::ConfigFetchFailed { .. }));
        assert_eq!(*store.creates.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn create_failure_is_reported() {
        let store = FakeStore {
            reject_create: true,
            ..FakeStore::default()
        };
        let err = sync_config(&store, "kube-system", "dns", Some(&defaults()))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::ConfigCreateFailed { .. }));
    }
}
