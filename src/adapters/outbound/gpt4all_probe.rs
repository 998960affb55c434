//! GPT4All Probe
//!
//! Implements ProtocolProbe for the GPT4All API server: a direct chat
//! completion, no model listing step.

use crate::domain::entities::BackendDescriptor;
use crate::domain::ports::ProtocolProbe;
use crate::domain::value_objects::ProbeOutcome;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

/// Probe for the GPT4All local API server.
pub struct Gpt4AllProbe {
    client: reqwest::Client,
}

impl Gpt4AllProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn run(&self, descriptor: &BackendDescriptor) -> Result<Option<String>, String> {
        let base = descriptor.endpoint_url.trim_end_matches('/');

        let body = serde_json::json!({
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

        let active_model = completion.model.filter(|m| !m.is_empty());
        Ok(active_model)
    }
}

#[async_trait]
impl ProtocolProbe for Gpt4AllProbe {
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
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<serde_json::Value>,
}
