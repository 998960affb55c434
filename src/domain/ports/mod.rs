mod process_controller;
mod protocol_probe;
mod registry_store;

pub use process_controller::ProcessController;
pub use protocol_probe::ProtocolProbe;
pub use registry_store::RegistryStore;
