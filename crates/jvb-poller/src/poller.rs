//! Stats poller: background task per bridge target.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use jvb_core::TargetConfig;
use jvb_metrics::StatsCollector;

use crate::fetch::fetch_stats;
use crate::tracker::PollTracker;

/// Per-target poller state.
struct PollerSlot {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

/// Manages one polling task per configured bridge.
pub struct StatsPoller {
    collector: StatsCollector,
    /// Active pollers: target id → slot.
    pollers: Arc<RwLock<HashMap<String, PollerSlot>>>,
}

impl StatsPoller {
    pub fn new(collector: StatsCollector) -> Self {
        Self {
            collector,
            pollers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start polling a target. An existing poller with the same id is replaced.
    pub async fn start_target(&self, target: &TargetConfig) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let target_owned = target.clone();
        let collector = self.collector.clone();

        let handle = tokio::spawn(async move {
            run_poll_loop(&target_owned, collector, shutdown_rx).await;
        });

        let mut pollers = self.pollers.write().await;
        if let Some(old) = pollers.insert(
            target.id.clone(),
            PollerSlot {
                handle,
                shutdown_tx,
            },
        ) {
            let _ = old.shutdown_tx.send(true);
            old.handle.abort();
        }

        info!(instance = %target.id, url = %target.url, interval_secs = target.interval.as_secs(), "poller started");
    }

    pub async fn stop_target(&self, id: &str) {
        let mut pollers = self.pollers.write().await;
        if let Some(slot) = pollers.remove(id) {
            let _ = slot.shutdown_tx.send(true);
            slot.handle.abort();
            info!(instance = %id, "poller stopped");
        }
    }

    /// Stop all pollers (for graceful shutdown).
    pub async fn stop_all(&self) {
        let mut pollers = self.pollers.write().await;
        for (id, slot) in pollers.drain() {
            let _ = slot.shutdown_tx.send(true);
            slot.handle.abort();
            debug!(instance = %id, "poller stopped");
        }
        info!("all pollers stopped");
    }

    pub async fn active_targets(&self) -> Vec<String> {
        let pollers = self.pollers.read().await;
        pollers.keys().cloned().collect()
    }

    pub async fn is_polling(&self, id: &str) -> bool {
        let pollers = self.pollers.read().await;
        pollers.contains_key(id)
    }
}

/// The fetch loop for a single target. The first fetch happens immediately.
async fn run_poll_loop(
    target: &TargetConfig,
    collector: StatsCollector,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tracker = PollTracker::new(target.interval);
    let mut wait = Duration::ZERO;

    debug!(instance = %target.id, url = %target.url, "poll loop starting");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                match fetch_stats(&target.url, target.timeout).await {
                    Ok(stats) => {
                        debug!(instance = %target.id, stats = stats.len(), "stats received");
                        collector.update(target.id.clone(), stats);
                        tracker.record_success();
                    }
                    Err(e) => {
                        debug!(instance = %target.id, error = %e, "stats fetch failed");
                        tracker.record_failure();
                    }
                }
                wait = tracker.next_interval();
            }
            _ = shutdown.changed() => {
                debug!(instance = %target.id, "poll loop shutting down");
                break;
            }
        }
    }
}
