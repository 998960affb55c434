//! modelwatch Library
//!
//! This module exposes the modelwatch components for use in integration
//! tests and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{MonitorConfig, MonitorError, MonitorService, RestartReport};
pub use config::load_config;
pub use domain::entities::{BackendDescriptor, BackendSnapshot, BackendState, HealthSummary};
pub use domain::ports::{ProcessController, ProtocolProbe, RegistryStore};
pub use domain::services::FallbackSelector;
pub use domain::value_objects::{BackendStatus, ProbeOutcome, ProviderKind};
