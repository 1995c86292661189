//! Periodic scan trigger.
//!
//! Calls `ScanEngine::scan` once per interval on a tokio task. The first
//! cycle runs one full interval after start; late ticks are delayed rather
//! than bursted. Shutdown stops future ticks and waits for a cycle already
//! in progress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::pipeline::engine::{ScanEngine, ScanOutcome};

pub struct PeriodicTrigger {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
    cycles: Arc<AtomicU64>,
}

impl PeriodicTrigger {
    /// Spawn the trigger on the current tokio runtime.
    pub fn start(engine: Arc<ScanEngine>, period: Duration) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        let cycles = Arc::new(AtomicU64::new(0));
        let task_cycles = Arc::clone(&cycles);

        log::info!("TRIGGER_START interval_secs={}", period.as_secs());

        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let outcome = engine.scan().await;
                        let n = task_cycles.fetch_add(1, Ordering::SeqCst) + 1;
                        if let ScanOutcome::Failed(reason) = &outcome {
                            log::warn!("TRIGGER_CYCLE_FAILED cycle={} reason={}", n, reason);
                        }
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }

            log::info!("TRIGGER_STOPPED");
        });

        Self {
            stop,
            handle,
            cycles,
        }
    }

    /// Cycles run so far.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Cancel pending ticks and wait for any in-flight cycle to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.handle.await {
            log::error!("TRIGGER_JOIN_FAILED error={}", e);
        }
    }
}
