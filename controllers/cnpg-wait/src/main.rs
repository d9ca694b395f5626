//! CNPG Wait
//!
//! Blocks until a CloudNativePG cluster, backup, job or arbitrary custom
//! resource reaches its target phase, and reports the outcome as the exit code:
//! 0 success, 1 failure, 2 timeout, 130 cancelled (Ctrl-C).

mod config;
mod error;

use crate::config::{WaitConfig, WaitKind};
use crate::error::ControllerError;
use anyhow::Result;
use cnpg_lifecycle::Lifecycle;
use phase_watcher::{CancellationToken, FieldPredicate, WatchOutcome};
use resource_client::ResourceRef;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn exit_code(outcome: &WatchOutcome) -> ExitCode {
    match outcome {
        WatchOutcome::Success { .. } => ExitCode::SUCCESS,
        WatchOutcome::Failure { .. } => ExitCode::from(1),
        WatchOutcome::TimedOut { .. } => ExitCode::from(2),
        WatchOutcome::Cancelled { .. } => ExitCode::from(130),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube's rustls stack needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("A rustls crypto provider was already installed");
    }

    info!("Starting CNPG Wait");

    let config = WaitConfig::from_env()?;
    info!("Configuration:");
    info!("  Namespace: {}", config.namespace);
    info!("  Resource: {:?} {}", config.kind, config.name);
    info!("  Poll interval: {:?}", config.policy.interval());
    info!("  Max polls: {}", config.policy.max_polls());
    if let Some(limit) = config.policy.max_elapsed() {
        info!("  Max wait: {:?}", limit);
    }

    let lifecycle = Lifecycle::try_default(config.namespace.as_str())
        .await
        .map_err(ControllerError::from)?
        .with_policy(config.policy);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling wait");
            on_signal.cancel();
        }
    });

    let outcome = match &config.kind {
        WaitKind::Cluster => lifecycle.wait_until_cluster_healthy(&config.name, &cancel).await,
        WaitKind::Backup => lifecycle.wait_until_backup_finished(&config.name, &cancel).await,
        WaitKind::Job => lifecycle.wait_until_job_finished(&config.name, &cancel).await,
        WaitKind::Custom {
            group,
            version,
            plural,
            field,
            success,
            failure,
        } => {
            let resource = ResourceRef::new(
                group.as_str(),
                version.as_str(),
                plural.as_str(),
                config.namespace.as_str(),
                config.name.as_str(),
            );
            let predicate = FieldPredicate::one_of(field.as_str(), success.iter().map(String::as_str))
                .failing_on(failure.iter().map(String::as_str))
                .pending_when_missing();
            lifecycle.wait_on(&resource, &predicate, &cancel).await
        }
    };

    match &outcome {
        WatchOutcome::Success { .. } => info!("{} {}", config.name, outcome),
        WatchOutcome::Failure { .. } => error!("{} {}", config.name, outcome),
        _ => warn!("{} {}", config.name, outcome),
    }

    Ok(exit_code(&outcome))
}
