//! proscale-core — shared vocabulary for the proscale autoscaler.
//!
//! Holds the cluster snapshot and configuration resource types, the
//! scale target descriptor parser, the async traits for the external
//! collaborators (cluster status, config store, scale target updater),
//! and the `AutoscalerConfig` loader.

pub mod client;
pub mod config;
pub mod error;
pub mod target;
pub mod types;

pub use client::{ClusterStatusProvider, ConfigStore, ScaleTargetUpdater};
pub use config::{AutoscalerConfig, ConfigError, DefaultParams, NAMESPACE_ENV, ResolvedConfig};
pub use error::{ClientError, ClientResult};
pub use target::{ScaleTarget, ScaleTargetSpec, TargetError, TargetKind};
pub use types::*;
