//! Shutdown Signal
//!
//! Latched cooperative stop flag shared between the entry point and the
//! scheduler. Draining in-flight checks is the scheduler's job (it owns
//! the task handles); this type only says "stop".

use std::sync::Arc;
use tokio::sync::watch;

/// One-shot stop flag.
///
/// Cheap to clone; every clone observes the same flag. Once raised it
/// never clears.
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Raise the flag. Safe to call more than once; only the first call
    /// does anything.
    pub fn trigger(&self) {
        let raised = self.tx.send_if_modified(|stopping| {
            if *stopping {
                false
            } else {
                *stopping = true;
                true
            }
        });
        if raised {
            tracing::info!("shutdown requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the flag is raised. Returns immediately if it already is.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        // The sender half lives inside self, so the channel cannot close
        let _ = rx.wait_for(|stopping| *stopping).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait until the process is asked to stop (Ctrl+C, or SIGTERM on unix).
#[cfg_attr(coverage_nightly, coverage(off))]
pub async fn wait_for_stop() {
    #[cfg(unix)]
    {
        let mut term =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("received Ctrl+C"),
            _ = term.recv() => tracing::info!("received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received Ctrl+C");
    }
}
