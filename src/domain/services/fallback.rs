//! Fallback Selector Service
//!
//! Pure domain logic for picking a substitute backend when one goes down.
//! This service has NO external dependencies - it's pure Rust.

use crate::domain::entities::BackendSnapshot;
use crate::domain::value_objects::BackendStatus;

/// Selector for a healthy substitute backend.
///
/// Selection is deterministic: the first backend in registry order that is
/// currently `Online` wins. Registry order is operator-controlled, so the
/// operator's preferred fallback is simply the one listed first.
pub struct FallbackSelector;

impl FallbackSelector {
    /// Pick the first online backend, optionally excluding one by name.
    ///
    /// # Arguments
    /// * `snapshots` - Current view of the registry, in registry order
    /// * `excluding` - Name of the backend being replaced, if any
    ///
    /// # Returns
    /// The first online candidate, or None if nothing usable is online
    pub fn pick_fallback(
        snapshots: &[BackendSnapshot],
        excluding: Option<&str>,
    ) -> Option<BackendSnapshot> {
        snapshots
            .iter()
            .filter(|s| s.status == BackendStatus::Online)
            .find(|s| excluding != Some(s.name.as_str()))
            .cloned()
    }
}
