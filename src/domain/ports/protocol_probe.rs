//! Protocol Probe Port
//!
//! Defines the interface for functionally probing an inference backend.

use crate::domain::entities::BackendDescriptor;
use crate::domain::value_objects::ProbeOutcome;
use async_trait::async_trait;

/// Functional health probe for one protocol family.
///
/// This is an outbound port that abstracts the provider-specific HTTP
/// conversation. Implementations exist per provider (Ollama, LM Studio,
/// LocalAI, GPT4All, Oobabooga) plus a dispatcher over all of them.
///
/// A probe reports what happened, it never fails: transport errors, bad
/// status codes and malformed bodies all come back as a failure outcome
/// with the latency measured up to that point.
#[async_trait]
pub trait ProtocolProbe: Send + Sync {
    /// Run one functional check against the backend.
    async fn probe(&self, descriptor: &BackendDescriptor) -> ProbeOutcome;
}
