//! Infrastructure Layer
//!
//! Cross-cutting concerns and infrastructure components.

pub mod reachability;
pub mod shutdown;

pub use shutdown::{wait_for_stop, ShutdownSignal};
