//! redb table definitions for the standalone store.
//!
//! Record tables use `&str` keys and `&[u8]` values (JSON-serialized types).

use redb::TableDefinition;

/// Nodes keyed by node name.
pub const NODES: RecordTable = TableDefinition::new("nodes");

/// Configuration resources keyed by `{namespace}/{name}`.
pub const CONFIG_MAPS: RecordTable = TableDefinition::new("config_maps");

/// Workloads keyed by `{namespace}/{kind}/{name}`.
pub const WORKLOADS: RecordTable = TableDefinition::new("workloads");

/// Store-wide counters.
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Key in [`META`] of the last issued config map revision.
pub const REVISION_KEY: &str = "revision";

/// Shape shared by every JSON record table.
pub type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;
