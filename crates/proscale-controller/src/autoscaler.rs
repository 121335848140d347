//! The autoscaler: one sequential poll loop per process.

use std::sync::Arc;
use std::time::Duration;

use proscale_core::{
    ClusterStatus, ClusterStatusProvider, ConfigData, ConfigStore, ResolvedConfig, ScaleTarget,
    ScaleTargetSpec, ScaleTargetUpdater,
};
use proscale_health::HealthInfo;
use proscale_policy::{PolicyKind, PolicyResolver};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::config_sync::sync_config;
use crate::error::{LoopError, ReconcileError};

/// The systems a poll talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub cluster: Arc<dyn ClusterStatusProvider>,
    pub configs: Arc<dyn ConfigStore>,
    pub updater: Arc<dyn ScaleTargetUpdater>,
}

/// What a successful poll saw and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub status: ClusterStatus,
    pub version: String,
    pub kind: PolicyKind,
    /// Whether this poll installed a new policy.
    pub rebuilt: bool,
    pub expected: u32,
    /// Replica count of each target before the update.
    pub previous: Vec<(ScaleTarget, u32)>,
}

pub struct Autoscaler {
    collaborators: Collaborators,
    health: Arc<HealthInfo>,
    resolver: PolicyResolver,
    targets: ScaleTargetSpec,
    configmap: String,
    default_params: Option<ConfigData>,
    poll_period: Duration,
    max_sync_failures: u32,
}

impl Autoscaler {
    pub fn new(
        config: &ResolvedConfig,
        collaborators: Collaborators,
        health: Arc<HealthInfo>,
    ) -> Self {
        Self {
            collaborators,
            health,
            resolver: PolicyResolver::new(),
            targets: config.targets.clone(),
            configmap: config.configmap.clone(),
            default_params: config.default_params.clone(),
            poll_period: config.poll_period,
            max_sync_failures: config.max_sync_failures,
        }
    }

    pub fn resolver(&self) -> &PolicyResolver {
        &self.resolver
    }

    pub fn health(&self) -> &Arc<HealthInfo> {
        &self.health
    }

    /// Run a single attempt. Stops at the first failing step or target.
    pub async fn poll_once(&mut self) -> Result<PollReport, ReconcileError> {
        let status = self
            .collaborators
            .cluster
            .cluster_status()
            .await
            .map_err(ReconcileError::ClusterStatusUnavailable)?;
        debug!(%status, "cluster status");

        let config = sync_config(
            self.collaborators.configs.as_ref(),
            self.targets.namespace(),
            &self.configmap,
            self.default_params.as_ref(),
        )
        .await?;

        let rebuilt = self.resolver.needs_rebuild(&config.version);
        let policy = self.resolver.resolve(&config)?;
        let kind = policy.kind();
        let expected = policy.expected_replicas(&status);
        debug!(%kind, expected, "evaluated scaling policy");

        let mut previous = Vec::with_capacity(self.targets.len());
        for target in self.targets.targets() {
            let before = self
                .collaborators
                .updater
                .update_replicas(target, expected)
                .await
                .map_err(|source| ReconcileError::ScaleUpdateFailed {
                    target: target.clone(),
                    source,
                })?;
            previous.push((target.clone(), before));
        }

        Ok(PollReport {
            status,
            version: config.version,
            kind,
            rebuilt,
            expected,
            previous,
        })
    }

    /// Poll every period until `shutdown` flips or too many polls fail.
    ///
    /// The first poll fires immediately. An in-flight poll always runs to
    /// completion before the stop signal is observed.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), LoopError> {
        info!(
            targets = %self.targets,
            configmap = %self.configmap,
            poll_period_ms = self.poll_period.as_millis() as u64,
            max_sync_failures = self.max_sync_failures,
            "autoscaler started"
        );

        let mut ticker = tokio::time::interval(self.poll_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = self.poll_once().await;
                    let failures = self.record(outcome);
                    if self.max_sync_failures > 0 && failures >= self.max_sync_failures {
                        error!(failures, "too many consecutive sync failures, stopping");
                        return Err(LoopError::SyncFailureThresholdReached { failures });
                    }
                }
                _ = shutdown.changed() => {
                    info!("autoscaler shutting down");
                    return Ok(());
                }
            }
        }
    }

    fn record(&self, outcome: Result<PollReport, ReconcileError>) -> u32 {
        match outcome {
            Ok(report) => {
                debug!(
                    version = %report.version,
                    expected = report.expected,
                    rebuilt = report.rebuilt,
                    "poll succeeded"
                );
                self.health.record_outcome(None)
            }
            Err(e) => self.health.record_outcome(Some(Arc::new(e))),
        }
    }
}
