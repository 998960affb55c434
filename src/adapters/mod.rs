//! Adapters Layer
//!
//! Inbound adapters drive the application (scheduler); outbound adapters
//! implement the domain ports (probes, registry store, process control).

pub mod inbound;
pub mod outbound;
