//! Ollama Probe
//!
//! Implements ProtocolProbe for Ollama: list the installed models, then
//! run a short generation against the first one.

use crate::domain::entities::BackendDescriptor;
use crate::domain::ports::ProtocolProbe;
use crate::domain::value_objects::ProbeOutcome;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

/// Probe for the Ollama HTTP API.
///
/// A backend that answers `/api/tags` but has nothing installed is not
/// functional, so an empty model list is a failure, not a success.
pub struct OllamaProbe {
    client: reqwest::Client,
}

impl OllamaProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn run(&self, descriptor: &BackendDescriptor) -> Result<Option<String>, String> {
        let base = descriptor.endpoint_url.trim_end_matches('/');

        let response = self
            .client
            .get(format!("{}/api/tags", base))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status().as_u16()));
        }
        let tags: TagsResponse = response.json().await.map_err(|e| e.to_string())?;

        let model = match tags.models.first() {
            Some(entry) => entry.name.clone(),
            None => return Err("no models available".to_string()),
        };

        let body = serde_json::json!({
            "model": model,
            "prompt": descriptor.test_prompt,
            "stream": false,
        });
        let response = self
            .client
            .post(format!("{}/api/generate", base))
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status().as_u16()));
        }
        let generated: GenerateResponse = response.json().await.map_err(|e| e.to_string())?;

        if generated.response.trim().is_empty() {
            return Err("empty response".to_string());
        }

        Ok(Some(model))
    }
}

#[async_trait]
impl ProtocolProbe for OllamaProbe {
    async fn probe(&self, descriptor: &BackendDescriptor) -> ProbeOutcome {
        let started = Instant::now();
        match self.run(descriptor).await {
            Ok(active_model) => {
                ProbeOutcome::success(started.elapsed().as_secs_f64() * 1000.0, active_model)
            }
            Err(error) => {
                ProbeOutcome::failure(started.elapsed().as_secs_f64() * 1000.0, error)
            }
        }
    }
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TaggedModel>,
}

#[derive(Deserialize)]
struct TaggedModel {
    name: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}
