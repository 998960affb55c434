//! Check Scheduler Adapter
//!
//! Drives the monitor service on a timer: each cycle fans the registered
//! backends out over a bounded worker pool and tallies the outcomes.

use crate::application::MonitorService;
use crate::domain::value_objects::BackendStatus;
use crate::infrastructure::ShutdownSignal;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between check cycles
    pub check_interval: Duration,
    /// Budget for one backend check, measured from task spawn
    pub task_timeout: Duration,
    /// Number of checks allowed to run at once
    pub max_concurrent: usize,
    /// Pause before retrying after a cycle that failed outright
    pub error_backoff: Duration,
    /// How long shutdown waits for abandoned checks to land their results
    pub drain_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            task_timeout: Duration::from_secs(30),
            max_concurrent: 5,
            error_backoff: Duration::from_secs(30),
            drain_timeout: Duration::from_secs(20),
        }
    }
}

/// Outcome tally for one check cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub online: usize,
    pub failing: usize,
    pub timed_out: usize,
}

/// Check Scheduler - inbound adapter that triggers checks on a timer.
///
/// This adapter:
/// 1. Wakes on a fixed interval and snapshots the registry order
/// 2. Spawns one check task per backend, bounded by a semaphore
/// 3. Waits for each task up to the per-task budget
///
/// A task that overruns its budget is abandoned, never cancelled: it keeps
/// its pool slot and writes its result whenever it finishes. Cancelling
/// mid-check could leave a restart sequence half done. The scheduler keeps
/// the abandoned handle and, on shutdown, gives such stragglers a bounded
/// window to finish before `run` returns.
pub struct CheckScheduler {
    service: Arc<MonitorService>,
    shutdown: ShutdownSignal,
    config: SchedulerConfig,
    semaphore: Arc<Semaphore>,
    /// Checks that outlived their cycle, still running in the background
    stragglers: Mutex<Vec<(String, JoinHandle<bool>)>>,
}

impl CheckScheduler {
    /// Create a new scheduler over the given service.
    pub fn new(
        service: Arc<MonitorService>,
        shutdown: ShutdownSignal,
        config: SchedulerConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            service,
            shutdown,
            config,
            semaphore,
            stragglers: Mutex::new(Vec::new()),
        }
    }

    /// Run the scheduler until shutdown is signalled, then drain.
    pub async fn run(&self) {
        tracing::info!(
            "scheduler started: {} backends every {:?}",
            self.service.backend_names().len(),
            self.config.check_interval
        );

        loop {
            if self.shutdown.is_triggered() {
                break;
            }

            let delay = match self.run_cycle().await {
                Ok(stats) => {
                    tracing::info!(
                        "check cycle complete: {} online, {} failing, {} timed out",
                        stats.online,
                        stats.failing,
                        stats.timed_out
                    );
                    self.config.check_interval
                }
                Err(error) => {
                    tracing::error!("check cycle failed: {:?}, backing off", error);
                    self.config.error_backoff
                }
            };

            tokio::select! {
                _ = self.shutdown.triggered() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.drain().await;
        tracing::info!("scheduler stopped");
    }

    /// Check every registered backend once.
    async fn run_cycle(&self) -> anyhow::Result<CycleStats> {
        // Forget stragglers that have since landed their results
        self.stragglers
            .lock()
            .retain(|(_, handle)| !handle.is_finished());

        let names = self.service.backend_names();
        let mut tasks = Vec::with_capacity(names.len());

        for name in names {
            let permit = self.semaphore.clone().acquire_owned().await?;
            let service = Arc::clone(&self.service);
            let task_name = name.clone();
            let spawned_at = Instant::now();

            let handle = tokio::spawn(async move {
                // The pool slot lives as long as the check does, even if
                // the scheduler stops waiting
                let _permit = permit;

                match service.check_backend(&task_name).await {
                    Ok(snapshot) => snapshot.status == BackendStatus::Online,
                    Err(error) => {
                        tracing::warn!("check for {} failed: {}", task_name, error);
                        false
                    }
                }
            });

            tasks.push((name, spawned_at, handle));
        }

        let mut stats = CycleStats::default();
        for (name, spawned_at, mut handle) in tasks {
            let remaining = self.config.task_timeout.saturating_sub(spawned_at.elapsed());
            match tokio::time::timeout(remaining, &mut handle).await {
                Ok(Ok(true)) => stats.online += 1,
                Ok(Ok(false)) => stats.failing += 1,
                Ok(Err(join_error)) => {
                    if join_error.is_panic() {
                        return Err(anyhow::anyhow!("check task for {} panicked", name));
                    }
                    stats.failing += 1;
                }
                Err(_) => {
                    stats.timed_out += 1;
                    tracing::warn!(
                        "check for {} exceeded {:?}, leaving it to finish on its own",
                        name,
                        self.config.task_timeout
                    );
                    self.stragglers.lock().push((name, handle));
                }
            }
        }

        Ok(stats)
    }

    /// Give abandoned checks a bounded window to land their results.
    async fn drain(&self) {
        let stragglers = std::mem::take(&mut *self.stragglers.lock());
        if stragglers.is_empty() {
            return;
        }

        tracing::info!(
            "waiting up to {:?} for {} in-flight checks",
            self.config.drain_timeout,
            stragglers.len()
        );

        let deadline = Instant::now() + self.config.drain_timeout;
        for (name, handle) in stragglers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if tokio::time::timeout(remaining, handle).await.is_err() {
                tracing::warn!("check for {} still running at shutdown", name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::MonitorConfig;
    use crate::domain::entities::{BackendDescriptor, BackendSnapshot};
    use crate::domain::ports::{ProcessController, ProtocolProbe, RegistryStore};
    use crate::domain::value_objects::{ProbeOutcome, ProviderKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ===== Test Doubles =====

    /// Probe that sleeps, then succeeds for names starting with "up".
    /// Tracks how many probes run at once.
    struct StubProbe {
        delay: Duration,
        concurrent: AtomicUsize,
        high_water: AtomicUsize,
    }

    impl StubProbe {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                concurrent: AtomicUsize::new(0),
                high_water: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ProtocolProbe for StubProbe {
        async fn probe(&self, descriptor: &BackendDescriptor) -> ProbeOutcome {
            let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.high_water.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.concurrent.fetch_sub(1, Ordering::SeqCst);

            if descriptor.name.starts_with("up") {
                ProbeOutcome::success(2.0, None)
            } else {
                ProbeOutcome::failure(2.0, "connection refused")
            }
        }
    }

    struct NoopProcess;

    #[async_trait]
    impl ProcessController for NoopProcess {
        async fn stop_matching(&self, _process_name: &str) -> anyhow::Result<bool> {
            Ok(false)
        }

        async fn launch(&self, _command: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct NullStore;

    #[async_trait]
    impl RegistryStore for NullStore {
        async fn load(&self) -> anyhow::Result<Option<Vec<BackendSnapshot>>> {
            Ok(None)
        }

        async fn save(&self, _snapshots: &[BackendSnapshot]) -> anyhow::Result<()> {
            Ok(())
        }
    }

    // ===== Test Helpers =====

    fn descriptor(name: &str) -> BackendDescriptor {
        BackendDescriptor {
            name: name.to_string(),
            provider: ProviderKind::Ollama,
            endpoint_url: "http://localhost:11434".to_string(),
            port: 11434,
            process_name: "ollama".to_string(),
            start_command: "ollama serve".to_string(),
            test_prompt: "Hello".to_string(),
        }
    }

    fn build(
        names: &[&str],
        probe_delay: Duration,
        config: SchedulerConfig,
    ) -> (
        CheckScheduler,
        Arc<MonitorService>,
        Arc<StubProbe>,
        ShutdownSignal,
    ) {
        let probe = StubProbe::new(probe_delay);
        let monitor_config = MonitorConfig {
            restart_grace: Duration::from_millis(1),
            stabilize_delay: Duration::from_millis(1),
        };
        let service = Arc::new(MonitorService::new(
            monitor_config,
            probe.clone(),
            Arc::new(NoopProcess),
            Arc::new(NullStore),
            names.iter().map(|n| descriptor(n)).collect(),
        ));
        let shutdown = ShutdownSignal::new();
        let scheduler = CheckScheduler::new(service.clone(), shutdown.clone(), config);
        (scheduler, service, probe, shutdown)
    }

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            check_interval: Duration::from_millis(20),
            task_timeout: Duration::from_secs(5),
            max_concurrent: 5,
            error_backoff: Duration::from_millis(20),
            drain_timeout: Duration::from_secs(2),
        }
    }

    // ===== Cycle Tests =====

    #[tokio::test]
    async fn test_cycle_tallies_mixed_fleet() {
        let (scheduler, _, _, _) = build(
            &["up-a", "down-b", "up-c"],
            Duration::from_millis(1),
            fast_config(),
        );

        let stats = scheduler.run_cycle().await.unwrap();

        assert_eq!(stats.online, 2);
        assert_eq!(stats.failing, 1);
        assert_eq!(stats.timed_out, 0);
    }

    #[tokio::test]
    async fn test_cycle_updates_backend_state() {
        let (scheduler, service, _, _) =
            build(&["up-a", "down-b"], Duration::from_millis(1), fast_config());

        scheduler.run_cycle().await.unwrap();

        let statuses = service.all_statuses();
        assert_eq!(statuses[0].status, BackendStatus::Online);
        assert_eq!(statuses[1].status, BackendStatus::Offline);
    }

    #[tokio::test]
    async fn test_cycle_bounds_concurrency() {
        let mut config = fast_config();
        config.max_concurrent = 2;
        let (scheduler, _, probe, _) = build(
            &["up-1", "up-2", "up-3", "up-4", "up-5", "up-6"],
            Duration::from_millis(20),
            config,
        );

        let stats = scheduler.run_cycle().await.unwrap();

        assert_eq!(stats.online, 6);
        assert!(probe.high_water.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_slow_check_abandoned_but_finishes() {
        let mut config = fast_config();
        config.task_timeout = Duration::from_millis(30);
        let (scheduler, service, _, _) =
            build(&["up-slow"], Duration::from_millis(150), config);

        let stats = scheduler.run_cycle().await.unwrap();

        // The cycle moved on without a result, keeping the handle around
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.online, 0);
        assert_eq!(scheduler.stragglers.lock().len(), 1);
        assert_eq!(service.all_statuses()[0].status, BackendStatus::Unknown);

        // The abandoned task keeps running and lands its result
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(service.all_statuses()[0].status, BackendStatus::Online);
    }

    #[tokio::test]
    async fn test_finished_stragglers_are_pruned() {
        let mut config = fast_config();
        config.task_timeout = Duration::from_millis(30);
        let (scheduler, _, _, _) = build(&["up-slow"], Duration::from_millis(100), config);

        scheduler.run_cycle().await.unwrap();
        assert_eq!(scheduler.stragglers.lock().len(), 1);

        // The first straggler lands; the next cycle drops its handle while
        // abandoning its own slow check
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.run_cycle().await.unwrap();
        assert_eq!(scheduler.stragglers.lock().len(), 1);
    }

    // ===== Run Loop Tests =====

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (scheduler, service, _, shutdown) =
            build(&["up-a"], Duration::from_millis(1), fast_config());

        let handle = tokio::spawn(async move { scheduler.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        let joined = tokio::time::timeout(Duration::from_millis(500), handle).await;
        assert!(joined.is_ok());
        assert_eq!(service.all_statuses()[0].status, BackendStatus::Online);
    }

    #[tokio::test]
    async fn test_run_exits_immediately_when_already_shut_down() {
        let (scheduler, _, probe, shutdown) =
            build(&["up-a"], Duration::from_millis(1), fast_config());
        shutdown.trigger();

        let joined =
            tokio::time::timeout(Duration::from_millis(200), scheduler.run()).await;

        assert!(joined.is_ok());
        // No cycle ran, so no probe ever started
        assert_eq!(probe.high_water.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_abandoned_check() {
        let mut config = fast_config();
        config.task_timeout = Duration::from_millis(30);
        config.check_interval = Duration::from_millis(500);
        let (scheduler, service, _, shutdown) =
            build(&["up-slow"], Duration::from_millis(150), config);

        let handle = tokio::spawn(async move { scheduler.run().await });
        // The first cycle has abandoned the slow check by now
        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();

        // The drain window let the abandoned check land its result
        assert_eq!(service.all_statuses()[0].status, BackendStatus::Online);
    }
}
