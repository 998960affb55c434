//! Monitor Service - Main application use case
//!
//! Orchestrates backend health: running checks, applying results,
//! driving automatic restarts, and answering status queries. This is
//! the primary interface for the inbound adapters.

use crate::domain::entities::{
    default_backends, BackendDescriptor, BackendSnapshot, BackendState, HealthSummary,
};
use crate::domain::ports::{ProcessController, ProtocolProbe, RegistryStore};
use crate::domain::services::FallbackSelector;
use crate::domain::value_objects::{BackendStatus, ProbeOutcome};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;

/// Timing knobs for the restart sequence.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pause between stopping the old process and launching the new one
    pub restart_grace: Duration,
    /// Wait after launching before the backend is probed again
    pub stabilize_delay: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            restart_grace: Duration::from_secs(2),
            stabilize_delay: Duration::from_secs(10),
        }
    }
}

/// Errors surfaced by the query operations.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("no backend named {0}")]
    UnknownBackend(String),
}

/// Result of an operator-requested restart.
#[derive(Debug, Clone)]
pub struct RestartReport {
    /// Whether the launch command spawned
    pub launched: bool,
    /// Whether the follow-up check found the backend online
    pub healthy: bool,
    /// Backend view after the follow-up check
    pub snapshot: BackendSnapshot,
}

/// Configuration and live state of one backend, guarded as a unit.
struct BackendEntry {
    descriptor: BackendDescriptor,
    state: BackendState,
}

/// One registry slot. The mutex covers descriptor and state together so
/// a check always applies its result against the configuration it probed.
struct MonitoredBackend {
    name: String,
    inner: Mutex<BackendEntry>,
}

/// Monitor service - main application use case.
///
/// This service orchestrates the health loop:
/// 1. Probes backends through the protocol port
/// 2. Applies outcomes to per-backend state
/// 3. Restarts failing backends within their attempt budget
/// 4. Persists the registry on operator-triggered mutations
///
/// Per-backend locks are never held across an await; a check clones the
/// descriptor out, probes, then re-locks to apply the outcome. Two
/// overlapping checks of the same backend are harmless, the later write
/// wins.
pub struct MonitorService {
    backends: RwLock<Vec<Arc<MonitoredBackend>>>,
    probe: Arc<dyn ProtocolProbe>,
    process: Arc<dyn ProcessController>,
    store: Arc<dyn RegistryStore>,
    config: MonitorConfig,
}

impl MonitorService {
    /// Create a service over the given backends, all starting unchecked.
    pub fn new(
        config: MonitorConfig,
        probe: Arc<dyn ProtocolProbe>,
        process: Arc<dyn ProcessController>,
        store: Arc<dyn RegistryStore>,
        descriptors: Vec<BackendDescriptor>,
    ) -> Self {
        let entries = descriptors
            .into_iter()
            .map(|descriptor| (descriptor, BackendState::new()))
            .collect();
        Self::from_entries(config, probe, process, store, entries)
    }

    /// Create a service from the registry document, seeding defaults when
    /// no document exists yet.
    ///
    /// A document that exists but cannot be parsed is a hard error: losing
    /// an operator's configuration to a silent reseed is worse than
    /// refusing to start.
    pub async fn load(
        config: MonitorConfig,
        probe: Arc<dyn ProtocolProbe>,
        process: Arc<dyn ProcessController>,
        store: Arc<dyn RegistryStore>,
    ) -> anyhow::Result<Self> {
        match store.load().await? {
            Some(snapshots) => {
                tracing::info!("loaded {} backends from registry", snapshots.len());
                let entries = snapshots
                    .iter()
                    .map(|snapshot| (snapshot.descriptor(), snapshot.initial_state()))
                    .collect();
                Ok(Self::from_entries(config, probe, process, store, entries))
            }
            None => {
                let defaults = default_backends();
                tracing::info!(
                    "no registry document found, seeding {} default backends",
                    defaults.len()
                );
                let service = Self::new(config, probe, process, store, defaults);
                service.persist().await;
                Ok(service)
            }
        }
    }

    fn from_entries(
        config: MonitorConfig,
        probe: Arc<dyn ProtocolProbe>,
        process: Arc<dyn ProcessController>,
        store: Arc<dyn RegistryStore>,
        entries: Vec<(BackendDescriptor, BackendState)>,
    ) -> Self {
        let backends = entries
            .into_iter()
            .map(|(descriptor, state)| {
                Arc::new(MonitoredBackend {
                    name: descriptor.name.clone(),
                    inner: Mutex::new(BackendEntry { descriptor, state }),
                })
            })
            .collect();

        Self {
            backends: RwLock::new(backends),
            probe,
            process,
            store,
            config,
        }
    }

    /// Names of all registered backends, in registry order.
    pub fn backend_names(&self) -> Vec<String> {
        self.backends.read().iter().map(|b| b.name.clone()).collect()
    }

    /// Current view of every backend, in registry order.
    pub fn all_statuses(&self) -> Vec<BackendSnapshot> {
        self.backends
            .read()
            .iter()
            .map(|backend| {
                let entry = backend.inner.lock();
                BackendSnapshot::from_parts(&entry.descriptor, &entry.state)
            })
            .collect()
    }

    /// Aggregate fleet health.
    pub fn health_summary(&self) -> HealthSummary {
        HealthSummary::from_snapshots(&self.all_statuses())
    }

    /// First online backend other than `excluding`, if any.
    pub fn select_fallback(&self, excluding: Option<&str>) -> Option<BackendSnapshot> {
        FallbackSelector::pick_fallback(&self.all_statuses(), excluding)
    }

    /// Run one full check against a backend, restarting it if it fails
    /// and its attempt budget allows.
    ///
    /// After a restart the backend is probed exactly once more; that
    /// follow-up never triggers another restart. Scheduled cycles call
    /// this directly and do not persist.
    pub async fn check_backend(&self, name: &str) -> Result<BackendSnapshot, MonitorError> {
        let backend = self
            .find(name)
            .ok_or_else(|| MonitorError::UnknownBackend(name.to_string()))?;

        let mut recovery_spent = false;
        loop {
            let descriptor = backend.inner.lock().descriptor.clone();
            tracing::debug!("checking backend {}", backend.name);
            let outcome = self.probe.probe(&descriptor).await;

            if outcome.is_success() {
                return Ok(self.apply_outcome(&backend, outcome));
            }

            let snapshot = self.apply_outcome(&backend, outcome);
            if recovery_spent || !self.begin_recovery(&backend) {
                return Ok(snapshot);
            }
            recovery_spent = true;
            self.run_restart_sequence(&descriptor).await;
            // Loop re-probes once now that the backend had time to settle
        }
    }

    /// Operator-triggered check: same as a scheduled check, but the
    /// resulting state is persisted.
    pub async fn test_backend(&self, name: &str) -> Result<BackendSnapshot, MonitorError> {
        let snapshot = self.check_backend(name).await?;
        self.persist().await;
        Ok(snapshot)
    }

    /// Operator-triggered restart: reset the attempt budget and cycle the
    /// process regardless of current health.
    ///
    /// The follow-up check applies its outcome normally but never starts
    /// another restart.
    pub async fn restart_backend(&self, name: &str) -> Result<RestartReport, MonitorError> {
        let backend = self
            .find(name)
            .ok_or_else(|| MonitorError::UnknownBackend(name.to_string()))?;

        tracing::info!("manual restart requested for {}", backend.name);
        let descriptor = {
            let mut entry = backend.inner.lock();
            entry.state.restart_attempts = 0;
            entry.state.status = BackendStatus::Starting;
            entry.descriptor.clone()
        };

        let launched = self.run_restart_sequence(&descriptor).await;
        let outcome = self.probe.probe(&descriptor).await;
        let snapshot = self.apply_outcome(&backend, outcome);
        self.persist().await;

        Ok(RestartReport {
            launched,
            healthy: snapshot.status == BackendStatus::Online,
            snapshot,
        })
    }

    /// Add a backend or replace the configuration of an existing one.
    ///
    /// Updating configuration keeps the live state: a port change should
    /// not erase the failure history the operator is debugging.
    pub async fn upsert_backend(&self, descriptor: BackendDescriptor) -> BackendSnapshot {
        let snapshot = {
            let mut backends = self.backends.write();
            let existing = backends.iter().position(|b| b.name == descriptor.name);

            match existing {
                Some(index) => {
                    let mut entry = backends[index].inner.lock();
                    entry.descriptor = descriptor;
                    tracing::info!("updated configuration for {}", backends[index].name);
                    BackendSnapshot::from_parts(&entry.descriptor, &entry.state)
                }
                None => {
                    let name = descriptor.name.clone();
                    let backend = Arc::new(MonitoredBackend {
                        name: name.clone(),
                        inner: Mutex::new(BackendEntry {
                            descriptor,
                            state: BackendState::new(),
                        }),
                    });
                    let snapshot = {
                        let entry = backend.inner.lock();
                        BackendSnapshot::from_parts(&entry.descriptor, &entry.state)
                    };
                    backends.push(backend);
                    tracing::info!("registered new backend {}", name);
                    snapshot
                }
            }
        };

        self.persist().await;
        snapshot
    }

    fn find(&self, name: &str) -> Option<Arc<MonitoredBackend>> {
        self.backends.read().iter().find(|b| b.name == name).cloned()
    }

    fn apply_outcome(&self, backend: &MonitoredBackend, outcome: ProbeOutcome) -> BackendSnapshot {
        match outcome {
            ProbeOutcome::Success {
                latency_ms,
                active_model,
            } => self.apply_success(backend, latency_ms, active_model),
            ProbeOutcome::Failure { latency_ms, error } => {
                self.apply_failure(backend, latency_ms, error)
            }
        }
    }

    fn apply_success(
        &self,
        backend: &MonitoredBackend,
        latency_ms: f64,
        active_model: Option<String>,
    ) -> BackendSnapshot {
        let mut entry = backend.inner.lock();
        let was_online = entry.state.status == BackendStatus::Online;

        entry.state.status = BackendStatus::Online;
        entry.state.last_checked_at = Some(Utc::now());
        entry.state.latency_ms = Some(latency_ms);
        entry.state.last_error = None;
        entry.state.restart_attempts = 0;
        entry.state.active_model = active_model;

        if !was_online {
            tracing::info!("backend {} is online ({:.1} ms)", backend.name, latency_ms);
        }
        BackendSnapshot::from_parts(&entry.descriptor, &entry.state)
    }

    fn apply_failure(
        &self,
        backend: &MonitoredBackend,
        latency_ms: f64,
        error: String,
    ) -> BackendSnapshot {
        let mut entry = backend.inner.lock();
        let was_online = entry.state.status == BackendStatus::Online;

        entry.state.status = BackendStatus::Offline;
        entry.state.last_checked_at = Some(Utc::now());
        entry.state.latency_ms = None;
        entry.state.last_error = Some(error.clone());
        entry.state.active_model = None;

        if was_online {
            tracing::warn!("backend {} went offline: {}", backend.name, error);
        } else {
            tracing::debug!(
                "backend {} still failing after {:.1} ms: {}",
                backend.name,
                latency_ms,
                error
            );
        }
        BackendSnapshot::from_parts(&entry.descriptor, &entry.state)
    }

    /// Claim one restart attempt. Returns false once the budget is spent.
    fn begin_recovery(&self, backend: &MonitoredBackend) -> bool {
        let mut entry = backend.inner.lock();
        if entry.state.restart_attempts >= entry.state.max_restart_attempts {
            tracing::debug!(
                "backend {} exhausted its restart budget ({} attempts)",
                backend.name,
                entry.state.max_restart_attempts
            );
            return false;
        }

        entry.state.restart_attempts += 1;
        entry.state.status = BackendStatus::Starting;
        tracing::info!(
            "backend {} failed, restart attempt {}/{}",
            backend.name,
            entry.state.restart_attempts,
            entry.state.max_restart_attempts
        );
        true
    }

    /// Stop whatever is running, launch fresh, and give it time to settle.
    ///
    /// Every step is best effort; the follow-up check is the only
    /// authority on whether the restart worked.
    async fn run_restart_sequence(&self, descriptor: &BackendDescriptor) -> bool {
        match self.process.stop_matching(&descriptor.process_name).await {
            Ok(true) => tracing::debug!("stopped processes matching {}", descriptor.process_name),
            Ok(false) => tracing::debug!("no process matching {} found", descriptor.process_name),
            Err(error) => {
                tracing::warn!("failed to stop {}: {:?}", descriptor.process_name, error)
            }
        }

        tokio::time::sleep(self.config.restart_grace).await;

        let launched = match self.process.launch(&descriptor.start_command).await {
            Ok(()) => {
                tracing::info!(
                    "launched {} via `{}`",
                    descriptor.name,
                    descriptor.start_command
                );
                true
            }
            Err(error) => {
                tracing::warn!("failed to launch {}: {:?}", descriptor.name, error);
                false
            }
        };

        tokio::time::sleep(self.config.stabilize_delay).await;
        launched
    }

    /// Write the current registry out, logging instead of failing.
    async fn persist(&self) {
        let snapshots = self.all_statuses();
        if let Err(error) = self.store.save(&snapshots).await {
            tracing::warn!("failed to persist registry: {:?}", error);
        }
    }
}
