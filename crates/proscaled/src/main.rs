//! proscaled — the cluster-proportional autoscaler daemon.
//!
//! Single binary that assembles:
//! - State store (redb) standing in for the cluster API
//! - Autoscaler poll loop
//! - Health endpoints + admin REST API
//!
//! # Usage
//!
//! ```text
//! proscaled --target deployment/coredns --configmap dns-autoscaler \
//!     --namespace kube-system --default-params '{"linear":{"coresPerReplica":256}}'
//! ```
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |---|---|
//! | 0 | Stopped by signal |
//! | 1 | Startup or config validation failed |
//! | 2 | Too many consecutive failed polls |

mod cli;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use proscale_controller::{Autoscaler, Collaborators, LoopError};
use proscale_health::HealthInfo;
use proscale_state::{LocalCluster, StateStore};
use tokio::sync::watch;
use tracing::{error, info};

use crate::cli::Cli;

const DEFAULT_LOG_FILTER: &str = "info,proscaled=debug,proscale=debug";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(Ok(())) => {
            info!("proscaled stopped");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!(error = %e, "autoscaler gave up");
            ExitCode::from(2)
        }
        Err(e) => {
            error!(error = ?e, "proscaled failed");
            ExitCode::from(1)
        }
    }
}

/// Start every subsystem and wait for a stop signal or the loop to give up.
///
/// The outer error covers startup; the inner one is the loop's verdict.
async fn run(cli: Cli) -> anyhow::Result<Result<(), LoopError>> {
    let config = cli.into_config()?;
    let resolved = config.validate()?;
    info!(
        targets = %resolved.targets,
        configmap = %resolved.configmap,
        "proscaled starting"
    );

    // ── Initialize subsystems ──────────────────────────────────

    std::fs::create_dir_all(&resolved.data_dir)
        .with_context(|| format!("creating data dir {}", resolved.data_dir.display()))?;
    let db_path = resolved.data_dir.join("proscale.redb");
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let health = Arc::new(HealthInfo::new());
    let collaborators = Collaborators {
        cluster: Arc::new(LocalCluster::new(store.clone(), resolved.node_selector.clone())),
        configs: Arc::new(store.clone()),
        updater: Arc::new(store.clone()),
    };
    let mut autoscaler = Autoscaler::new(&resolved, collaborators, health.clone());

    let router = proscale_health::health_router(health)
        .merge(proscale_api::build_router(store, resolved.namespace.clone()));
    let addr = SocketAddr::from(([0, 0, 0, 0], resolved.health_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "health and admin server listening");

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server_shutdown = shutdown_rx.clone();

    // ── Start background tasks ─────────────────────────────────

    let mut loop_handle = tokio::spawn(async move { autoscaler.run(shutdown_rx).await });
    let server_handle = tokio::spawn(
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .into_future(),
    );

    let verdict = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("installing ctrl-c handler")?;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
            loop_handle.await?
        }
        finished = &mut loop_handle => {
            let _ = shutdown_tx.send(true);
            finished?
        }
    };

    server_handle.await??;
    Ok(verdict)
}
