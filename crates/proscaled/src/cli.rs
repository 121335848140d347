//! Command line flags layered over the optional TOML config file.

use std::path::PathBuf;

use clap::Parser;
use proscale_core::{AutoscalerConfig, ConfigError, DefaultParams, NAMESPACE_ENV};

#[derive(Parser, Debug, Default)]
#[command(name = "proscaled", version, about = "Cluster-proportional autoscaler daemon")]
pub struct Cli {
    /// TOML file with defaults for every flag below.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Targets to scale, e.g. `deployment/coredns,replicaset/agent`.
    #[arg(long)]
    pub target: Option<String>,

    /// Config map holding the scaling parameters.
    #[arg(long)]
    pub configmap: Option<String>,

    /// Namespace of the targets and the config map.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Fallback namespace, read from the pod environment.
    #[arg(long = "pod-namespace", env = NAMESPACE_ENV, hide = true)]
    pub pod_namespace: Option<String>,

    /// JSON object seeding the config map when it does not exist.
    #[arg(long)]
    pub default_params: Option<String>,

    /// Seconds between polls.
    #[arg(long)]
    pub poll_period_seconds: Option<u64>,

    /// Consecutive failed polls before exiting. 0 disables.
    #[arg(long)]
    pub max_sync_failures: Option<u32>,

    /// Only count nodes carrying these labels, `key=value,key2=value2`.
    #[arg(long)]
    pub nodelabels: Option<String>,

    /// Port for the health and admin endpoints.
    #[arg(long)]
    pub health_port: Option<u16>,

    /// Directory of the standalone state database.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl Cli {
    /// Load the config file (if any) and apply flag overrides on top.
    pub fn into_config(self) -> Result<AutoscalerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => AutoscalerConfig::from_file(path)?,
            None => AutoscalerConfig::default(),
        };

        if let Some(target) = self.target {
            config.target = target;
        }
        if let Some(configmap) = self.configmap {
            config.configmap = configmap;
        }
        if let Some(namespace) = self.namespace {
            config.namespace = namespace;
        }
        if config.namespace.trim().is_empty()
            && let Some(namespace) = self.pod_namespace
        {
            config.namespace = namespace;
        }
        if let Some(raw) = self.default_params {
            config.default_params = Some(DefaultParams::from_json(&raw)?);
        }
        if let Some(secs) = self.poll_period_seconds {
            config.poll_period_seconds = secs;
        }
        if let Some(max) = self.max_sync_failures {
            config.max_sync_failures = max;
        }
        if let Some(nodelabels) = self.nodelabels {
            config.nodelabels = nodelabels;
        }
        if let Some(port) = self.health_port {
            config.health_port = port;
        }
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        Ok(config)
    }
}
