//! JSON Registry Store
//!
//! Implements RegistryStore as a single JSON document on disk, an object
//! keyed by backend name.

use crate::domain::entities::BackendSnapshot;
use crate::domain::ports::RegistryStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// File-backed registry store.
///
/// The document is a map keyed by backend name, so hand edits and diffs
/// stay readable and the write order is deterministic. After a reload the
/// registry order is the document's key order.
pub struct JsonRegistryStore {
    path: PathBuf,
}

impl JsonRegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RegistryStore for JsonRegistryStore {
    async fn load(&self) -> Result<Option<Vec<BackendSnapshot>>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("reading registry document {}", self.path.display())
                })
            }
        };

        let document: BTreeMap<String, BackendSnapshot> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing registry document {}", self.path.display()))?;

        Ok(Some(document.into_values().collect()))
    }

    async fn save(&self, snapshots: &[BackendSnapshot]) -> Result<()> {
        let document: BTreeMap<&str, &BackendSnapshot> = snapshots
            .iter()
            .map(|snapshot| (snapshot.name.as_str(), snapshot))
            .collect();
        let raw = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("creating registry directory {}", parent.display())
                })?;
            }
        }

        tokio::fs::write(&self.path, raw)
            .await
            .with_context(|| format!("writing registry document {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::entities::{BackendDescriptor, BackendState};
    use crate::domain::value_objects::{BackendStatus, ProviderKind};

    fn snapshot(name: &str, provider: ProviderKind) -> BackendSnapshot {
        let descriptor = BackendDescriptor {
            name: name.to_string(),
            provider,
            endpoint_url: "http://localhost:11434".to_string(),
            port: 11434,
            process_name: name.to_string(),
            start_command: format!("{} serve", name),
            test_prompt: "Hello".to_string(),
        };
        BackendSnapshot::from_parts(&descriptor, &BackendState::new())
    }

    // ===== Load Tests =====

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRegistryStore::new(dir.path().join("backends.json"));

        let loaded = store.load().await.unwrap();

        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_corrupt_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backends.json");
        tokio::fs::write(&path, "{not valid json").await.unwrap();

        let store = JsonRegistryStore::new(path);
        let result = store.load().await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_unknown_provider_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backends.json");
        let document = r#"{
            "mystery": {
                "name": "mystery",
                "provider": "vllm",
                "endpoint_url": "http://localhost:8000",
                "port": 8000,
                "process_name": "vllm",
                "start_command": "vllm serve",
                "test_prompt": "Hello",
                "status": "unknown",
                "restart_attempts": 0,
                "max_restart_attempts": 3
            }
        }"#;
        tokio::fs::write(&path, document).await.unwrap();

        let store = JsonRegistryStore::new(path);
        let result = store.load().await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_accepts_omitted_optional_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backends.json");
        let document = r#"{
            "ollama": {
                "name": "ollama",
                "provider": "ollama",
                "endpoint_url": "http://localhost:11434",
                "port": 11434,
                "process_name": "ollama",
                "start_command": "ollama serve",
                "test_prompt": "Hello",
                "status": "offline",
                "restart_attempts": 2,
                "max_restart_attempts": 5
            }
        }"#;
        tokio::fs::write(&path, document).await.unwrap();

        let store = JsonRegistryStore::new(path);
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].status, BackendStatus::Offline);
        assert!(loaded[0].last_checked_at.is_none());
        assert!(loaded[0].latency_ms.is_none());
        assert_eq!(loaded[0].max_restart_attempts, 5);
    }

    // ===== Save Tests =====

    #[tokio::test]
    async fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRegistryStore::new(dir.path().join("backends.json"));

        let snapshots = vec![
            snapshot("ollama", ProviderKind::Ollama),
            snapshot("lmstudio", ProviderKind::LmStudio),
        ];
        store.save(&snapshots).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded.len(), 2);
        // The document is keyed by name, so entries come back in key order
        assert_eq!(loaded[0].name, "lmstudio");
        assert_eq!(loaded[1].name, "ollama");
        assert_eq!(loaded[1].provider, ProviderKind::Ollama);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("backends.json");
        let store = JsonRegistryStore::new(path.clone());

        store.save(&[snapshot("ollama", ProviderKind::Ollama)]).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRegistryStore::new(dir.path().join("backends.json"));

        store
            .save(&[
                snapshot("ollama", ProviderKind::Ollama),
                snapshot("lmstudio", ProviderKind::LmStudio),
            ])
            .await
            .unwrap();
        store.save(&[snapshot("ollama", ProviderKind::Ollama)]).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "ollama");
    }

    #[tokio::test]
    async fn test_document_is_keyed_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backends.json");
        let store = JsonRegistryStore::new(path.clone());

        store
            .save(&[snapshot("ollama", ProviderKind::Ollama)])
            .await
            .unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert!(value.is_object());
        assert!(value.get("ollama").is_some());
        // The name is repeated inside the value for self-description
        assert_eq!(value["ollama"]["name"], "ollama");
        assert_eq!(value["ollama"]["status"], "unknown");
    }
}
