//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the modelwatch domain.
//! They have no external dependencies and contain only business logic.

use crate::domain::value_objects::{BackendStatus, ProviderKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Restart budget applied when a registry entry does not carry its own.
pub const DEFAULT_MAX_RESTART_ATTEMPTS: u32 = 3;

/// Static configuration of one monitored inference backend.
///
/// Descriptors are operator-editable and survive restarts via the registry
/// document. Everything needed to probe and to restart the backend lives
/// here; live health lives in [`BackendState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Unique identifier, also the registry document key
    pub name: String,
    /// Protocol family used to probe this backend
    pub provider: ProviderKind,
    /// Base URL of the HTTP API, scheme and host included
    pub endpoint_url: String,
    /// TCP port checked by the cheap reachability probe
    pub port: u16,
    /// Substring matched against process names for best-effort shutdown
    pub process_name: String,
    /// Shell command that launches the backend
    pub start_command: String,
    /// Prompt sent by functional probes that perform a generation
    pub test_prompt: String,
}

/// Mutable health state of one monitored backend.
///
/// Updated by every check; reset to `Unknown` on process start. The restart
/// counter only goes back to zero on a successful check or an operator
/// restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendState {
    pub status: BackendStatus,
    /// When the last check finished, successful or not
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Round-trip time of the last successful probe
    pub latency_ms: Option<f64>,
    pub last_error: Option<String>,
    /// Consecutive automatic restarts since the last success
    pub restart_attempts: u32,
    pub max_restart_attempts: u32,
    /// Model name the last successful probe discovered, when available
    pub active_model: Option<String>,
}

impl BackendState {
    pub fn new() -> Self {
        Self {
            status: BackendStatus::Unknown,
            last_checked_at: None,
            latency_ms: None,
            last_error: None,
            restart_attempts: 0,
            max_restart_attempts: DEFAULT_MAX_RESTART_ATTEMPTS,
            active_model: None,
        }
    }
}

impl Default for BackendState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of one backend, configuration and health combined.
///
/// This is the shape the registry document stores and the query API returns.
/// The name is repeated inside the value so each entry is self-describing
/// even when pulled out of the keyed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSnapshot {
    pub name: String,
    pub provider: ProviderKind,
    pub endpoint_url: String,
    pub port: u16,
    pub process_name: String,
    pub start_command: String,
    pub test_prompt: String,
    pub status: BackendStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub latency_ms: Option<f64>,
    pub last_error: Option<String>,
    pub restart_attempts: u32,
    pub max_restart_attempts: u32,
    pub active_model: Option<String>,
}

impl BackendSnapshot {
    pub fn from_parts(descriptor: &BackendDescriptor, state: &BackendState) -> Self {
        Self {
            name: descriptor.name.clone(),
            provider: descriptor.provider,
            endpoint_url: descriptor.endpoint_url.clone(),
            port: descriptor.port,
            process_name: descriptor.process_name.clone(),
            start_command: descriptor.start_command.clone(),
            test_prompt: descriptor.test_prompt.clone(),
            status: state.status,
            last_checked_at: state.last_checked_at,
            latency_ms: state.latency_ms,
            last_error: state.last_error.clone(),
            restart_attempts: state.restart_attempts,
            max_restart_attempts: state.max_restart_attempts,
            active_model: state.active_model.clone(),
        }
    }

    /// Extract the static configuration half of this snapshot.
    pub fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor {
            name: self.name.clone(),
            provider: self.provider,
            endpoint_url: self.endpoint_url.clone(),
            port: self.port,
            process_name: self.process_name.clone(),
            start_command: self.start_command.clone(),
            test_prompt: self.test_prompt.clone(),
        }
    }

    /// State a backend starts with after loading from the document.
    ///
    /// Health is stale information from a previous run, so everything resets
    /// to unchecked. Only the restart budget is carried over.
    pub fn initial_state(&self) -> BackendState {
        BackendState {
            max_restart_attempts: self.max_restart_attempts,
            ..BackendState::new()
        }
    }
}

/// Overall fleet health bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FleetStatus {
    /// Every registered backend is online
    Healthy,
    /// At least one backend is online, at least one is not
    Degraded,
    /// No backend is online
    Unhealthy,
}

/// Aggregated health across the whole registry.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSummary {
    pub status: FleetStatus,
    pub online: usize,
    pub total: usize,
    /// Names of the backends currently online, in registry order
    pub online_backends: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl HealthSummary {
    pub fn from_snapshots(snapshots: &[BackendSnapshot]) -> Self {
        let online_backends: Vec<String> = snapshots
            .iter()
            .filter(|s| s.status == BackendStatus::Online)
            .map(|s| s.name.clone())
            .collect();

        let online = online_backends.len();
        let total = snapshots.len();

        let status = if online == 0 {
            FleetStatus::Unhealthy
        } else if online == total {
            FleetStatus::Healthy
        } else {
            FleetStatus::Degraded
        };

        Self {
            status,
            online,
            total,
            online_backends,
            generated_at: Utc::now(),
        }
    }
}

/// Backends seeded on first run, when no registry document exists yet.
///
/// One entry per supported provider, each on its stock port with the stock
/// launch command.
pub fn default_backends() -> Vec<BackendDescriptor> {
    let entries = [
        (
            "ollama",
            ProviderKind::Ollama,
            "ollama",
            "ollama serve",
        ),
        (
            "lmstudio",
            ProviderKind::LmStudio,
            "lmstudio",
            "lmstudio server start",
        ),
        (
            "localai",
            ProviderKind::LocalAi,
            "local-ai",
            "local-ai --address :8080",
        ),
        ("gpt4all", ProviderKind::Gpt4All, "gpt4all", "gpt4all"),
        (
            "oobabooga",
            ProviderKind::Oobabooga,
            "python",
            "python server.py --api",
        ),
    ];

    entries
        .into_iter()
        .map(|(name, provider, process_name, start_command)| {
            let port = provider.default_port();
            BackendDescriptor {
                name: name.to_string(),
                provider,
                endpoint_url: format!("http://localhost:{}", port),
                port,
                process_name: process_name.to_string(),
                start_command: start_command.to_string(),
                test_prompt: "Hello".to_string(),
            }
        })
        .collect()
}
