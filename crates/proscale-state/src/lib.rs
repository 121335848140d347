//! proscale-state — standalone backend for the autoscaler.
//!
//! Backed by [redb](https://docs.rs/redb), stores the nodes, configuration
//! resources, and workloads that a real cluster API would otherwise serve.
//! [`StateStore`] implements [`ConfigStore`](proscale_core::ConfigStore) and
//! [`ScaleTargetUpdater`](proscale_core::ScaleTargetUpdater);
//! [`LocalCluster`] adds a node selector and implements
//! [`ClusterStatusProvider`](proscale_core::ClusterStatusProvider).
//!
//! # Architecture
//!
//! All records are JSON-serialized into redb's `&[u8]` value columns.
//! Config map versions come from a single store-wide revision counter,
//! so a deleted and recreated config map never reuses a version.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod cluster;
pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use cluster::LocalCluster;
pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
