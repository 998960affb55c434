//! LocalAI Probe
//!
//! Implements ProtocolProbe for LocalAI: list the served models, then
//! request a chat completion from the first one.

use crate::domain::entities::BackendDescriptor;
use crate::domain::ports::ProtocolProbe;
use crate::domain::value_objects::ProbeOutcome;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

/// Probe for the LocalAI HTTP API.
///
/// LocalAI exposes the OpenAI surface but requires the model id in the
/// request, so the listing step is mandatory. The completion only has to
/// produce a choice; some LocalAI builds return choices with empty
/// content for trivial prompts.
pub struct LocalAiProbe {
    client: reqwest::Client,
}

impl LocalAiProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn run(&self, descriptor: &BackendDescriptor) -> Result<Option<String>, String> {
        let base = descriptor.endpoint_url.trim_end_matches('/');

        let response = self
            .client
            .get(format!("{}/v1/models", base))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status().as_u16()));
        }
        let listing: ModelsResponse = response.json().await.map_err(|e| e.to_string())?;

        let model = match listing.data.first() {
            Some(entry) => entry.id.clone(),
            None => return Err("no models available".to_string()),
        };

        let body = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": descriptor.test_prompt}],
            "max_tokens": 16,
        });
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", base))
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status().as_u16()));
        }
        let completion: ChatResponse = response.json().await.map_err(|e| e.to_string())?;

        if completion.choices.is_empty() {
            return Err("no completion choices".to_string());
        }

        Ok(Some(model))
    }
}

#[async_trait]
impl ProtocolProbe for LocalAiProbe {
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
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<serde_json::Value>,
}
