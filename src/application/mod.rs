mod monitor_service;

pub use monitor_service::{MonitorConfig, MonitorError, MonitorService, RestartReport};
