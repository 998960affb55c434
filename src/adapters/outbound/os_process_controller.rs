//! OS Process Controller
//!
//! Implements ProcessController against the real process table: matching
//! processes are terminated (then killed), launches go through the shell.

use crate::domain::ports::ProcessController;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, Signal, System, UpdateKind};
use tokio::process::Command;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Process controller backed by the OS process table.
///
/// Matching is a case-insensitive substring check against the process name
/// and its command line, because the same backend shows up differently
/// depending on how it was launched (binary, wrapper script, `python ...`).
/// Stopping sends TERM first and escalates to KILL for whatever is still
/// alive after the termination wait.
pub struct OsProcessController {
    terminate_wait: Duration,
}

impl OsProcessController {
    pub fn new(terminate_wait: Duration) -> Self {
        Self { terminate_wait }
    }
}

#[async_trait]
impl ProcessController for OsProcessController {
    async fn stop_matching(&self, process_name: &str) -> Result<bool> {
        let pattern = process_name.to_string();
        let terminate_wait = self.terminate_wait;

        // sysinfo refreshes are blocking reads of the process table
        tokio::task::spawn_blocking(move || stop_blocking(&pattern, terminate_wait))
            .await
            .context("process stop task failed")
    }

    async fn launch(&self, command: &str) -> Result<()> {
        #[cfg(unix)]
        let mut shell = {
            let mut shell = Command::new("sh");
            shell.arg("-c").arg(command);
            shell
        };
        #[cfg(windows)]
        let mut shell = {
            let mut shell = Command::new("cmd");
            shell.arg("/C").arg(command);
            shell
        };

        let child = shell
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawning `{}`", command))?;

        // Reap the shell in the background so it never lingers as a zombie
        tokio::spawn(async move {
            let mut child = child;
            let _ = child.wait().await;
        });

        Ok(())
    }
}

fn stop_blocking(pattern: &str, terminate_wait: Duration) -> bool {
    let needle = pattern.to_lowercase();
    let own_pid = sysinfo::get_current_pid().ok();

    let mut sys = System::new();
    // Plain refresh_processes does not fetch command lines in sysinfo 0.37;
    // matching needs cmd() populated, so request it explicitly.
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
    );

    let matched: Vec<Pid> = sys
        .processes()
        .iter()
        .filter(|(pid, process)| Some(**pid) != own_pid && matches_pattern(process, &needle))
        .map(|(pid, _)| *pid)
        .collect();

    if matched.is_empty() {
        return false;
    }

    for pid in &matched {
        if let Some(process) = sys.process(*pid) {
            tracing::debug!("sending TERM to pid {} ({:?})", pid, process.name());
            if process.kill_with(Signal::Term).is_none() {
                // Platform without TERM support, go straight to a hard kill
                process.kill();
            }
        }
    }

    let deadline = Instant::now() + terminate_wait;
    loop {
        std::thread::sleep(POLL_INTERVAL);
        sys.refresh_processes(ProcessesToUpdate::Some(&matched), true);

        let alive: Vec<Pid> = matched
            .iter()
            .copied()
            .filter(|pid| sys.process(*pid).is_some())
            .collect();
        if alive.is_empty() {
            return true;
        }

        if Instant::now() >= deadline {
            for pid in alive {
                if let Some(process) = sys.process(pid) {
                    tracing::debug!("pid {} survived TERM, killing", pid);
                    process.kill();
                }
            }
            return true;
        }
    }
}

fn matches_pattern(process: &Process, needle: &str) -> bool {
    if process
        .name()
        .to_string_lossy()
        .to_lowercase()
        .contains(needle)
    {
        return true;
    }
    process
        .cmd()
        .iter()
        .any(|arg| arg.to_string_lossy().to_lowercase().contains(needle))
}
