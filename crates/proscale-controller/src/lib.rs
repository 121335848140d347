//! proscale-controller — the reconciliation loop.
//!
//! Each poll runs one attempt, start to finish:
//!
//! ```text
//! cluster_status ──▶ sync_config ──▶ resolver.resolve ──▶ expected_replicas
//!                                                              │
//!          health.record_outcome ◀── update_replicas (each target)
//! ```
//!
//! A failing step aborts the attempt. The outcome lands in the shared
//! [`HealthInfo`](proscale_health::HealthInfo); enough consecutive
//! failures stop the loop.

pub mod autoscaler;
pub mod config_sync;
pub mod error;

pub use autoscaler::{Autoscaler, Collaborators, PollReport};
pub use config_sync::sync_config;
pub use error::{LoopError, ReconcileError};
