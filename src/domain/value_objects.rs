//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};

/// Protocol family a monitored backend speaks.
///
/// Each kind maps to exactly one protocol adapter. The set is closed:
/// configuration entries with an unknown kind are rejected when the
/// registry document is loaded, never at probe time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Ollama: model listing via /api/tags, generation via /api/generate
    Ollama,
    /// LM Studio: OpenAI-style chat completions against the loaded model
    LmStudio,
    /// LocalAI: /v1/models listing followed by a chat completion
    LocalAi,
    /// GPT4All: OpenAI-style chat completions, no model listing
    Gpt4All,
    /// Oobabooga text-generation-webui: /api/v1/generate
    Oobabooga,
}

impl ProviderKind {
    /// Parse a provider tag. Returns `None` for unknown tags so that
    /// callers surface a configuration error instead of guessing.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "lmstudio" => Some(Self::LmStudio),
            "localai" => Some(Self::LocalAi),
            "gpt4all" => Some(Self::Gpt4All),
            "oobabooga" => Some(Self::Oobabooga),
            _ => None,
        }
    }

    /// Convert to the canonical lowercase tag used in the registry document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::LmStudio => "lmstudio",
            Self::LocalAi => "localai",
            Self::Gpt4All => "gpt4all",
            Self::Oobabooga => "oobabooga",
        }
    }

    /// Default TCP port the provider listens on out of the box.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Ollama => 11434,
            Self::LmStudio => 1234,
            Self::LocalAi => 8080,
            Self::Gpt4All => 4891,
            Self::Oobabooga => 5000,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Health status of a monitored backend.
///
/// `Degraded` is reserved: it round-trips through the registry document but
/// no current check logic assigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    /// Never checked since this process started
    Unknown,
    /// A restart sequence is in flight, waiting for stabilization
    Starting,
    /// Last functional probe succeeded
    Online,
    /// Reserved for future use
    Degraded,
    /// Last probe failed (unreachable, protocol error, or timed out)
    Offline,
}

impl BackendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Starting => "starting",
            Self::Online => "online",
            Self::Degraded => "degraded",
            Self::Offline => "offline",
        }
    }
}

impl Default for BackendStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one functional probe against a backend.
///
/// Probes never return a transport or protocol error to the caller; every
/// failure mode collapses into `Failure` with the latency that was measured
/// up to the point of failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Success {
        latency_ms: f64,
        /// Model the probe discovered or used, when the protocol exposes one
        active_model: Option<String>,
    },
    Failure {
        latency_ms: f64,
        error: String,
    },
}

impl ProbeOutcome {
    pub fn success(latency_ms: f64, active_model: Option<String>) -> Self {
        Self::Success {
            latency_ms,
            active_model,
        }
    }

    pub fn failure(latency_ms: f64, error: impl Into<String>) -> Self {
        Self::Failure {
            latency_ms,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn latency_ms(&self) -> f64 {
        match self {
            Self::Success { latency_ms, .. } | Self::Failure { latency_ms, .. } => *latency_ms,
        }
    }
}
