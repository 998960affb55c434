//! Registry Store Port
//!
//! Defines the interface for persisting the backend registry document.

use crate::domain::entities::BackendSnapshot;
use anyhow::Result;
use async_trait::async_trait;

/// Durable storage for backend configuration and last-known health.
///
/// This is an outbound port that abstracts the registry document.
/// The canonical implementation is a JSON file on disk.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Load the stored registry.
    ///
    /// Returns `Ok(None)` when no document exists yet, so the caller can
    /// seed defaults. A document that exists but cannot be understood is
    /// an error, never silently replaced.
    async fn load(&self) -> Result<Option<Vec<BackendSnapshot>>>;

    /// Write the full registry, replacing any previous document.
    async fn save(&self, snapshots: &[BackendSnapshot]) -> Result<()>;
}
