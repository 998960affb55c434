//! modelwatch - Inference Backend Watchdog with Hexagonal Architecture
//!
//! This is the composition root that wires together all the components.

mod adapters;
mod application;
mod config;
mod domain;
mod infrastructure;

use crate::adapters::inbound::{CheckScheduler, SchedulerConfig};
use crate::adapters::outbound::{JsonRegistryStore, OsProcessController, ProviderProbes};
use crate::application::{MonitorConfig, MonitorService};
use crate::config::load_config;
use crate::infrastructure::{wait_for_stop, ShutdownSignal};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting modelwatch registry={} interval={}s (hexagonal architecture)",
        cfg.registry_path,
        cfg.check_interval_secs
    );

    // ===== COMPOSITION ROOT =====
    // Wire up all adapters and services

    // 1. Create outbound adapters

    // Protocol probes (one shared HTTP client, TCP gate in front)
    let probes = Arc::new(ProviderProbes::new(
        Duration::from_secs(cfg.probe_timeout_secs),
        Duration::from_secs(cfg.tcp_timeout_secs),
    )?);

    // Process controller (OS process table)
    let process = Arc::new(OsProcessController::new(Duration::from_secs(
        cfg.terminate_wait_secs,
    )));

    // Registry store (JSON document)
    let store = Arc::new(JsonRegistryStore::new(cfg.registry_path.clone()));

    // 2. Create application service, seeding defaults on first run
    let monitor_config = MonitorConfig {
        restart_grace: Duration::from_secs(cfg.restart_grace_secs),
        stabilize_delay: Duration::from_secs(cfg.stabilize_secs),
    };
    let service = Arc::new(MonitorService::load(monitor_config, probes, process, store).await?);

    // 3. Create the inbound scheduler and run until signalled
    let shutdown = ShutdownSignal::new();
    let scheduler = CheckScheduler::new(
        service.clone(),
        shutdown.clone(),
        SchedulerConfig {
            check_interval: Duration::from_secs(cfg.check_interval_secs),
            task_timeout: Duration::from_secs(cfg.check_timeout_secs),
            max_concurrent: cfg.max_concurrent_checks,
            error_backoff: Duration::from_secs(cfg.error_backoff_secs),
            drain_timeout: Duration::from_secs(cfg.drain_secs),
        },
    );
    let scheduler_handle = tokio::spawn(async move { scheduler.run().await });

    wait_for_stop().await;
    shutdown.trigger();

    // The scheduler drains its own in-flight checks before returning
    let _ = scheduler_handle.await;

    tracing::info!("modelwatch stopped");
    Ok(())
}
