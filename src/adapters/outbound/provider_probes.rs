//! Provider Probe Dispatcher
//!
//! Implements ProtocolProbe over all supported provider families, with a
//! cheap TCP reachability gate ahead of any HTTP conversation.

use crate::adapters::outbound::{
    Gpt4AllProbe, LmStudioProbe, LocalAiProbe, OllamaProbe, OobaboogaProbe,
};
use crate::domain::entities::BackendDescriptor;
use crate::domain::ports::ProtocolProbe;
use crate::domain::value_objects::{ProbeOutcome, ProviderKind};
use crate::infrastructure::reachability;
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Composite probe covering every `ProviderKind`.
///
/// One HTTP client is shared by all family probes; its builder-level
/// timeout bounds every protocol conversation. Backends whose port does
/// not even accept a TCP connection fail fast with
/// `"port not accessible"` and never reach a family probe.
pub struct ProviderProbes {
    tcp_timeout: Duration,
    ollama: OllamaProbe,
    lm_studio: LmStudioProbe,
    local_ai: LocalAiProbe,
    gpt4all: Gpt4AllProbe,
    oobabooga: OobaboogaProbe,
}

impl ProviderProbes {
    /// Build the probe set.
    ///
    /// `probe_timeout` caps each HTTP request; `tcp_timeout` caps the
    /// reachability gate.
    pub fn new(probe_timeout: Duration, tcp_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(probe_timeout).build()?;

        Ok(Self {
            tcp_timeout,
            ollama: OllamaProbe::new(client.clone()),
            lm_studio: LmStudioProbe::new(client.clone()),
            local_ai: LocalAiProbe::new(client.clone()),
            gpt4all: Gpt4AllProbe::new(client.clone()),
            oobabooga: OobaboogaProbe::new(client),
        })
    }
}

#[async_trait]
impl ProtocolProbe for ProviderProbes {
    async fn probe(&self, descriptor: &BackendDescriptor) -> ProbeOutcome {
        let started = Instant::now();
        let host = reachability::host_of(&descriptor.endpoint_url);

        if !reachability::port_open(&host, descriptor.port, self.tcp_timeout).await {
            let latency = started.elapsed().as_secs_f64() * 1000.0;
            return ProbeOutcome::failure(latency, "port not accessible");
        }

        match descriptor.provider {
            ProviderKind::Ollama => self.ollama.probe(descriptor).await,
            ProviderKind::LmStudio => self.lm_studio.probe(descriptor).await,
            ProviderKind::LocalAi => self.local_ai.probe(descriptor).await,
            ProviderKind::Gpt4All => self.gpt4all.probe(descriptor).await,
            ProviderKind::Oobabooga => self.oobabooga.probe(descriptor).await,
        }
    }
}
