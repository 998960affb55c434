mod gpt4all_probe;
mod json_registry_store;
mod lm_studio_probe;
mod local_ai_probe;
mod ollama_probe;
mod oobabooga_probe;
mod os_process_controller;
mod provider_probes;

pub use gpt4all_probe::Gpt4AllProbe;
pub use json_registry_store::JsonRegistryStore;
pub use lm_studio_probe::LmStudioProbe;
pub use local_ai_probe::LocalAiProbe;
pub use ollama_probe::OllamaProbe;
pub use oobabooga_probe::OobaboogaProbe;
pub use os_process_controller::OsProcessController;
pub use provider_probes::ProviderProbes;
