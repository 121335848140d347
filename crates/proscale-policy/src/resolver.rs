//! Policy resolver — owns the active policy and swaps it on config change.
//!
//! ```text
//! Unset ─resolve(v1)─▶ Active(policy, v1) ─resolve(v2)─▶ Active(policy', v2)
//!                          │
//!                          └─resolve(v2) fails─▶ Active(policy, v1)  (unchanged)
//! ```

use proscale_core::ConfigResource;
use tracing::{debug, info};

use crate::error::{PolicyError, PolicyResult};
use crate::policy::{PolicyKind, ScalingPolicy};

/// A policy together with the config version it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePolicy {
    pub policy: ScalingPolicy,
    pub version: String,
}

#[derive(Debug, Default)]
pub struct PolicyResolver {
    active: Option<ActivePolicy>,
}

impl PolicyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActivePolicy> {
        self.active.as_ref()
    }

    pub fn version(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.version.as_str())
    }

    pub fn kind(&self) -> Option<PolicyKind> {
        self.active.as_ref().map(|a| a.policy.kind())
    }

    /// Whether a config at `version` requires a rebuild.
    pub fn needs_rebuild(&self, version: &str) -> bool {
        self.version() != Some(version)
    }

    /// The policy for `config`, rebuilt only when its version differs
    /// from the active one.
    ///
    /// On error the active policy is left exactly as it was.
    pub fn resolve(&mut self, config: &ConfigResource) -> PolicyResult<&ScalingPolicy> {
        let active = match self.active.take() {
            Some(active) if active.version == config.version => active,
            previous => {
                info!(
                    old = previous.as_ref().map_or("<none>", |a| a.version.as_str()),
                    new = %config.version,
                    "detected config version change, rebuilding policy"
                );
                let previous_kind = previous.as_ref().map(|a| a.policy.kind());
                let policy = match Self::build(config) {
                    Ok(policy) => policy,
                    Err(e) => {
                        self.active = previous;
                        return Err(e);
                    }
                };
                if previous_kind != Some(policy.kind()) {
                    info!(mode = %policy.kind(), "set control mode");
                }
                ActivePolicy {
                    policy,
                    version: config.version.clone(),
                }
            }
        };
        Ok(&self.active.insert(active).policy)
    }

    fn build(config: &ConfigResource) -> PolicyResult<ScalingPolicy> {
        let mut entries = config.data.iter();
        let (key, params) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(PolicyError::AmbiguousPolicyConfig {
                    keys: config.data.keys().cloned().collect(),
                });
            }
        };
        let kind: PolicyKind = key.parse()?;
        debug!(%kind, %params, "params from config store");
        kind.parse(params)
    }
}
