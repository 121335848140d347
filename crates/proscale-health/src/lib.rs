//! proscale-health — poll health for the autoscaler.
//!
//! The reconciliation loop records the outcome of every poll into a
//! shared [`HealthInfo`]. The HTTP transport reads it concurrently.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/healthz` | Liveness, always 200 |
//! | GET | `/last-poll` | 200 if the last poll succeeded, 500 with the error otherwise |
//! | GET | `/status` | JSON with the failure count and last error |
//!
//! # Fail-fast
//!
//! [`HealthInfo::record_outcome`] returns the consecutive failure count.
//! The loop compares it with its `max_sync_failures` setting and stops
//! once the threshold is reached, letting the orchestrator restart a
//! wedged instance.

pub mod server;
pub mod tracker;

pub use server::health_router;
pub use tracker::{HealthInfo, HealthSnapshot, PollError};
