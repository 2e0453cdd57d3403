use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Handle to a task spawned by [`spawn_periodic`].
pub struct PeriodicHandle {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl PeriodicHandle {
    /// Ask the task to stop after any in-flight cycle and wait for it.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(err) = self.join.await {
            warn!(task = self.name, ?err, "periodic task join failed");
        }
    }

    /// Wait for the task without requesting a stop (it runs indefinitely
    /// unless the process exits, so this normally never returns).
    pub async fn join(self) {
        if let Err(err) = self.join.await {
            warn!(task = self.name, ?err, "periodic task join failed");
        }
    }
}

/// Run `cycle` once immediately, then on every `period` tick until stopped.
///
/// Cycles execute sequentially inside a single task: a cycle that outlasts
/// the period delays the next tick instead of overlapping it. Cycle errors
/// are logged and the schedule continues.
pub fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut cycle: F) -> PeriodicHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let join = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = cycle().await {
                        warn!(task = name, ?err, "periodic cycle failed");
                    }
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        info!(task = name, "periodic task stopping");
                        break;
                    }
                }
            }
        }
    });
    PeriodicHandle {
        name,
        stop_tx,
        join,
    }
}
