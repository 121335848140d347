//! StateStore — redb-backed persistence for the standalone backend.
//!
//! Provides typed CRUD operations over nodes, config maps, and workloads.
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).

use std::path::Path;
use std::sync::Arc;

use proscale_core::{ConfigData, ConfigResource, ScaleTarget};
use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// How a config map write treats an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Create,
    Update,
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(NODES).map_err(map_err!(Table))?;
        txn.open_table(CONFIG_MAPS).map_err(map_err!(Table))?;
        txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Nodes ──────────────────────────────────────────────────────

    /// Insert or update a node.
    pub fn put_node(&self, node: &NodeInfo) -> StateResult<()> {
        self.put(NODES, &node.name, node)?;
        debug!(node = %node.name, "node stored");
        Ok(())
    }

    pub fn get_node(&self, name: &str) -> StateResult<Option<NodeInfo>> {
        self.get(NODES, name)
    }

    pub fn list_nodes(&self) -> StateResult<Vec<NodeInfo>> {
        self.list(NODES)
    }

    /// Delete a node by name. Returns true if it existed.
    pub fn delete_node(&self, name: &str) -> StateResult<bool> {
        let existed = self.delete(NODES, name)?;
        debug!(node = %name, existed, "node deleted");
        Ok(existed)
    }

    // ── Config maps ────────────────────────────────────────────────

    pub fn get_config_map(&self, namespace: &str, name: &str) -> StateResult<Option<ConfigResource>> {
        self.get(CONFIG_MAPS, &config_key(namespace, name))
    }

    pub fn list_config_maps(&self) -> StateResult<Vec<ConfigResource>> {
        self.list(CONFIG_MAPS)
    }

    /// Create a config map. Fails with `AlreadyExists` if one is present.
    pub fn create_config_map(
        &self,
        namespace: &str,
        name: &str,
        data: ConfigData,
    ) -> StateResult<ConfigResource> {
        self.write_config_map(namespace, name, data, WriteMode::Create)
    }

    /// Replace the data of an existing config map. Fails with `NotFound`
    /// if it is absent.
    pub fn update_config_map(
        &self,
        namespace: &str,
        name: &str,
        data: ConfigData,
    ) -> StateResult<ConfigResource> {
        self.write_config_map(namespace, name, data, WriteMode::Update)
    }

    /// Delete a config map. Returns true if it existed.
    pub fn delete_config_map(&self, namespace: &str, name: &str) -> StateResult<bool> {
        let key = config_key(namespace, name);
        let existed = self.delete(CONFIG_MAPS, &key)?;
        debug!(%key, existed, "config map deleted");
        Ok(existed)
    }

    /// Every write takes a fresh store-wide revision as its version.
    fn write_config_map(
        &self,
        namespace: &str,
        name: &str,
        data: ConfigData,
        mode: WriteMode,
    ) -> StateResult<ConfigResource> {
        let key = config_key(namespace, name);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let resource;
        {
            let mut table = txn.open_table(CONFIG_MAPS).map_err(map_err!(Table))?;
            let exists = table.get(key.as_str()).map_err(map_err!(Read))?.is_some();
            match (mode, exists) {
                (WriteMode::Create, true) => {
                    return Err(StateError::AlreadyExists {
                        kind: "configmap",
                        key,
                    });
                }
                (WriteMode::Update, false) => {
                    return Err(StateError::NotFound {
                        kind: "configmap",
                        key,
                    });
                }
                (WriteMode::Create, false) | (WriteMode::Update, true) => {}
            }
            resource = ConfigResource {
                namespace: namespace.to_string(),
                name: name.to_string(),
                data,
                version: next_revision(&txn)?.to_string(),
            };
            let value = serde_json::to_vec(&resource).map_err(map_err!(Serialize))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, version = %resource.version, ?mode, "config map stored");
        Ok(resource)
    }

    // ── Workloads ──────────────────────────────────────────────────

    /// Insert or update a workload.
    pub fn put_workload(&self, workload: &WorkloadRecord) -> StateResult<()> {
        let key = workload.table_key();
        self.put(WORKLOADS, &key, workload)?;
        debug!(%key, replicas = workload.replicas, "workload stored");
        Ok(())
    }

    pub fn get_workload(&self, target: &ScaleTarget) -> StateResult<Option<WorkloadRecord>> {
        self.get(WORKLOADS, &target.table_key())
    }

    pub fn list_workloads(&self) -> StateResult<Vec<WorkloadRecord>> {
        self.list(WORKLOADS)
    }

    /// Set the replica count of an existing workload.
    ///
    /// Returns the previous count. Unknown workloads yield `NotFound`.
    pub fn set_workload_replicas(&self, target: &ScaleTarget, replicas: u32) -> StateResult<u32> {
        let key = target.table_key();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let previous;
        {
            let mut table = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
            let mut record: WorkloadRecord = match table.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?,
                None => {
                    return Err(StateError::NotFound {
                        kind: "workload",
                        key,
                    });
                }
            };
            previous = record.replicas;
            record.replicas = replicas;
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, from = previous, to = replicas, "workload replicas set");
        Ok(previous)
    }

    // ── Generic helpers ────────────────────────────────────────────

    fn put<T: Serialize>(
        &self,
        table_def: RecordTable,
        key: &str,
        value: &T,
    ) -> StateResult<()> {
        let value = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table_def).map_err(map_err!(Table))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(
        &self,
        table_def: RecordTable,
        key: &str,
    ) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_def).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value = serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn list<T: DeserializeOwned>(
        &self,
        table_def: RecordTable,
    ) -> StateResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_def).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            results.push(serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?);
        }
        Ok(results)
    }

    fn delete(&self, table_def: RecordTable, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(table_def).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }
}

fn config_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

fn next_revision(txn: &WriteTransaction) -> StateResult<u64> {
    let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
    let current = meta
        .get(REVISION_KEY)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value())
        .unwrap_or(0);
    let next = current + 1;
    meta.insert(REVISION_KEY, next).map_err(map_err!(Write))?;
    Ok(next)
}
