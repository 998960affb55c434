//! Process Controller Port
//!
//! Defines the interface for stopping and launching backend processes.

use anyhow::Result;
use async_trait::async_trait;

/// Control over backend OS processes, used by the restart sequence.
///
/// This is an outbound port that abstracts process discovery and spawning.
/// Everything here is best effort: a backend may run under a supervisor,
/// inside a container, or not at all, and the health check that follows a
/// restart is the only authority on whether it worked.
#[async_trait]
pub trait ProcessController: Send + Sync {
    /// Stop every running process whose name or command line matches.
    ///
    /// Asks politely first, then force-kills whatever is still alive after
    /// the grace window. Returns whether any matching process was found.
    async fn stop_matching(&self, process_name: &str) -> Result<bool>;

    /// Launch the backend via its configured shell command.
    ///
    /// The child is detached; success only means the command spawned.
    async fn launch(&self, command: &str) -> Result<()>;
}
