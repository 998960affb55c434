use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Registry persistence
    pub registry_path: String,

    // Scheduler settings
    pub check_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub check_timeout_secs: u64,
    pub max_concurrent_checks: usize,

    // Probe timeouts
    pub tcp_timeout_secs: u64,
    pub probe_timeout_secs: u64,

    // Restart sequence timing
    pub restart_grace_secs: u64,
    pub stabilize_secs: u64,
    pub terminate_wait_secs: u64,

    // Shutdown settings
    pub drain_secs: u64,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_path: "config/backends.json".to_string(),
            check_interval_secs: 60,
            error_backoff_secs: 30,
            check_timeout_secs: 30,
            max_concurrent_checks: 5,
            tcp_timeout_secs: 3,
            probe_timeout_secs: 15,
            restart_grace_secs: 2,
            stabilize_secs: 10,
            terminate_wait_secs: 5,
            drain_secs: 20,
            debug: false,
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    let registry_path = std::env::var("MODELWATCH_REGISTRY_PATH")
        .unwrap_or_else(|_| "config/backends.json".to_string());

    let check_interval_secs = std::env::var("MODELWATCH_CHECK_INTERVAL_SECS")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .unwrap_or(60);

    let error_backoff_secs = std::env::var("MODELWATCH_ERROR_BACKOFF_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .unwrap_or(30);

    let check_timeout_secs = std::env::var("MODELWATCH_CHECK_TIMEOUT_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .unwrap_or(30);

    let max_concurrent_checks = std::env::var("MODELWATCH_MAX_CONCURRENT_CHECKS")
        .unwrap_or_else(|_| "5".to_string())
        .parse()
        .unwrap_or(5);

    let tcp_timeout_secs = std::env::var("MODELWATCH_TCP_TIMEOUT_SECS")
        .unwrap_or_else(|_| "3".to_string())
        .parse()
        .unwrap_or(3);

    let probe_timeout_secs = std::env::var("MODELWATCH_PROBE_TIMEOUT_SECS")
        .unwrap_or_else(|_| "15".to_string())
        .parse()
        .unwrap_or(15);

    let restart_grace_secs = std::env::var("MODELWATCH_RESTART_GRACE_SECS")
        .unwrap_or_else(|_| "2".to_string())
        .parse()
        .unwrap_or(2);

    let stabilize_secs = std::env::var("MODELWATCH_STABILIZE_SECS")
        .unwrap_or_else(|_| "10".to_string())
        .parse()
        .unwrap_or(10);

    let terminate_wait_secs = std::env::var("MODELWATCH_TERMINATE_WAIT_SECS")
        .unwrap_or_else(|_| "5".to_string())
        .parse()
        .unwrap_or(5);

    let drain_secs = std::env::var("MODELWATCH_DRAIN_SECS")
        .unwrap_or_else(|_| "20".to_string())
        .parse()
        .unwrap_or(20);

    let debug = std::env::var("DEBUG").is_ok();

    Ok(Config {
        registry_path,
        check_interval_secs,
        error_backoff_secs,
        check_timeout_secs,
        max_concurrent_checks,
        tcp_timeout_secs,
        probe_timeout_secs,
        restart_grace_secs,
        stabilize_secs,
        terminate_wait_secs,
        drain_secs,
        debug,
    })
}
