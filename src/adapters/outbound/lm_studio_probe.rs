//! LM Studio Probe
//!
//! Implements ProtocolProbe for LM Studio's OpenAI-compatible server:
//! one short chat completion against whatever model is loaded.

use crate::domain::entities::BackendDescriptor;
use crate::domain::ports::ProtocolProbe;
use crate::domain::value_objects::ProbeOutcome;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

/// Probe for the LM Studio local server.
///
/// LM Studio serves the model the operator loaded in the UI, so there is
/// no listing step. The completion must come back with actual content;
/// a well-formed but empty answer means the model is wedged.
pub struct LmStudioProbe {
    client: reqwest::Client,
}

impl LmStudioProbe {
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
        let has_content = completion
            .choices
            .iter()
            .any(|choice| !choice.message.content.trim().is_empty());
        if !has_content {
            return Err("empty completion".to_string());
        }

        let active_model = completion.model.filter(|m| !m.is_empty());
        Ok(active_model)
    }
}

#[async_trait]
impl ProtocolProbe for LmStudioProbe {
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
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}
