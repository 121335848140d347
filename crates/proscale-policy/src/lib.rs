//! proscale-policy — cluster-size driven replica policies.
//!
//! A policy maps a [`ClusterStatus`](proscale_core::ClusterStatus) to a
//! replica count. Two variants exist, selected by the single key of the
//! configuration resource:
//!
//! ```text
//! ladder: step function over (threshold, replicas) tables
//!     replicas = max(lookup(cores, coresToReplicas),
//!                    lookup(nodes, nodesToReplicas))
//!
//! linear: proportional with clamps
//!     replicas = max(clamp(ceil(cores / coresPerReplica), min, max),
//!                    clamp(ceil(nodes / nodesPerReplica), min, max))
//! ```
//!
//! The [`PolicyResolver`] owns the active policy and its config version.
//! A new policy is built in full before it replaces the old one, so a bad
//! config never leaves a half-applied policy behind.

pub mod error;
pub mod ladder;
pub mod linear;
pub mod policy;
pub mod resolver;

pub use error::{PolicyError, PolicyResult};
pub use ladder::{LadderEntry, LadderPolicy};
pub use linear::LinearPolicy;
pub use policy::{PolicyKind, ScalingPolicy};
pub use resolver::{ActivePolicy, PolicyResolver};
