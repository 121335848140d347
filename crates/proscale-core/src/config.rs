//! Autoscaler configuration.
//!
//! `AutoscalerConfig` is the raw, user-facing shape: it can be read from a
//! TOML file and is then overridden field by field from command line flags.
//! [`AutoscalerConfig::validate`] checks everything at once and produces a
//! [`ResolvedConfig`] with parsed targets, selector, and poll period.
//!
//! ```toml
//! target = "deployment/coredns"
//! configmap = "dns-autoscaler"
//! namespace = "kube-system"
//! poll_period_seconds = 10
//! max_sync_failures = 3
//!
//! [default_params.linear]
//! coresPerReplica = 256
//! nodesPerReplica = 16
//! preventSinglePointFailure = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::error;

use crate::target::ScaleTargetSpec;
use crate::types::{ConfigData, NodeSelector};

/// Environment variable consulted when no namespace is configured.
pub const NAMESPACE_ENV: &str = "MY_POD_NAMESPACE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid default params: {0}")]
    DefaultParams(String),

    #[error("failed to validate all input parameters: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Default configuration written to the config store when the named
/// resource is missing.
///
/// Accepts a JSON object (from the command line) or a table (from TOML).
/// Each top-level value is re-serialized to a JSON string, which is the
/// shape the policy parsers consume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultParams(ConfigData);

impl DefaultParams {
    /// Parse a JSON object such as `{"linear":{"coresPerReplica":2}}`.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let values: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(raw).map_err(|e| ConfigError::DefaultParams(e.to_string()))?;
        Self::from_values(values)
    }

    fn from_values(values: BTreeMap<String, serde_json::Value>) -> Result<Self, ConfigError> {
        let mut data = ConfigData::new();
        for (key, value) in values {
            let encoded = serde_json::to_string(&value)
                .map_err(|e| ConfigError::DefaultParams(e.to_string()))?;
            data.insert(key, encoded);
        }
        Ok(Self(data))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_data(self) -> ConfigData {
        self.0
    }
}

impl<'de> Deserialize<'de> for DefaultParams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Self::from_values(values).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutoscalerConfig {
    /// Targets to scale, e.g. `deployment/coredns,replicaset/agent`.
    pub target: String,
    /// Name of the configuration resource holding the scaling params.
    pub configmap: String,
    /// Namespace of the targets and the configuration resource.
    pub namespace: String,
    pub default_params: Option<DefaultParams>,
    pub poll_period_seconds: u64,
    /// Consecutive failed polls before the process exits. 0 disables.
    pub max_sync_failures: u32,
    /// Node label selector, `key=value,key2=value2`.
    pub nodelabels: String,
    pub health_port: u16,
    /// Directory of the standalone state database.
    pub data_dir: PathBuf,
}

impl Default for AutoscalerConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            configmap: String::new(),
            namespace: String::new(),
            default_params: None,
            poll_period_seconds: 10,
            max_sync_failures: 0,
            nodelabels: String::new(),
            health_port: 8080,
            data_dir: PathBuf::from("/var/lib/proscale"),
        }
    }
}

/// Validated configuration ready to drive the autoscaler.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub targets: ScaleTargetSpec,
    pub configmap: String,
    pub namespace: String,
    pub default_params: Option<ConfigData>,
    pub poll_period: Duration,
    pub max_sync_failures: u32,
    pub node_selector: NodeSelector,
    pub health_port: u16,
    pub data_dir: PathBuf,
}

impl AutoscalerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check every field, logging each problem, and resolve the parsed
    /// forms. All problems are reported together.
    pub fn validate(&self) -> Result<ResolvedConfig, ConfigError> {
        let mut problems = Vec::new();

        if self.configmap.trim().is_empty() {
            problems.push("--configmap parameter cannot be empty".to_string());
        }
        if self.namespace.trim().is_empty() {
            problems.push(format!(
                "--namespace parameter not set and failed to fall back to ${NAMESPACE_ENV}"
            ));
        }
        if self.poll_period_seconds < 1 {
            problems.push("--poll-period-seconds cannot be less than 1".to_string());
        }

        let targets = match ScaleTargetSpec::parse(&self.target, self.namespace.trim()) {
            Ok(targets) => Some(targets),
            Err(e) => {
                problems.push(format!("--target: {e}"));
                None
            }
        };
        let node_selector = match NodeSelector::parse(&self.nodelabels) {
            Ok(selector) => selector,
            Err(e) => {
                problems.push(format!("--nodelabels: {e}"));
                NodeSelector::default()
            }
        };

        for problem in &problems {
            error!("{problem}");
        }
        match targets {
            Some(targets) if problems.is_empty() => Ok(ResolvedConfig {
                targets,
                configmap: self.configmap.trim().to_string(),
                namespace: self.namespace.trim().to_string(),
                default_params: self
                    .default_params
                    .clone()
                    .filter(|p| !p.is_empty())
                    .map(DefaultParams::into_data),
                poll_period: Duration::from_secs(self.poll_period_seconds),
                max_sync_failures: self.max_sync_failures,
                node_selector,
                health_port: self.health_port,
                data_dir: self.data_dir.clone(),
            }),
            _ => Err(ConfigError::Invalid(problems)),
        }
    }
}
