//! Oobabooga Probe
//!
//! Implements ProtocolProbe for text-generation-webui's legacy API:
//! one short generation request.

use crate::domain::entities::BackendDescriptor;
use crate::domain::ports::ProtocolProbe;
use crate::domain::value_objects::ProbeOutcome;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

/// Probe for the Oobabooga generation endpoint.
///
/// The API reports no model name, so this probe never sets one.
pub struct OobaboogaProbe {
    client: reqwest::Client,
}

impl OobaboogaProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn run(&self, descriptor: &BackendDescriptor) -> Result<Option<String>, String> {
        let base = descriptor.endpoint_url.trim_end_matches('/');

        let body = serde_json::json!({
            "prompt": descriptor.test_prompt,
            "max_length": 32,
        });
        let response = self
            .client
            .post(format!("{}/api/v1/generate", base))
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status().as_u16()));
        }
        let generated: GenerateResponse = response.json().await.map_err(|e| e.to_string())?;

        if generated.results.is_empty() {
            return Err("no generation results".to_string());
        }
        let has_text = generated
            .results
            .iter()
            .any(|result| !result.text.trim().is_empty());
        if !has_text {
            return Err("empty response".to_string());
        }

        Ok(None)
    }
}

#[async_trait]
impl ProtocolProbe for OobaboogaProbe {
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
struct GenerateResponse {
    #[serde(default)]
    results: Vec<GenerationResult>,
}

#[derive(Deserialize)]
struct GenerationResult {
    #[serde(default)]
    text: String,
}
