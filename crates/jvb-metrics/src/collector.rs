//! Stats collector: the scrape-time pipeline.
//!
//! Owns the stats cache and the catalog. `update` is called whenever a
//! bridge reports; `describe` and `collect` are called by the exposition
//! layer on every scrape.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info};

use jvb_core::{Catalog, InstanceId, MetricDescriptor, RawStat};

use crate::cache::StatsCache;
use crate::metric::OutputMetric;
use crate::translator::translate;

/// Collects metrics for every bridge instance that reported recently.
#[derive(Debug, Clone)]
pub struct StatsCollector {
    cache: StatsCache,
    catalog: Arc<Catalog>,
    /// Snapshots older than this are left out of `collect`.
    retention: Duration,
}

impl StatsCollector {
    pub fn new(catalog: Catalog, retention: Duration) -> Self {
        Self {
            cache: StatsCache::new(),
            catalog: Arc::new(catalog),
            retention,
        }
    }

    /// Record the latest stats payload of an instance.
    pub fn update(&self, instance_id: impl Into<InstanceId>, stats: Vec<RawStat>) {
        self.cache.update(instance_id, stats);
    }

    /// Catalog descriptors, for pre-registering metric shapes.
    pub fn describe(&self) -> &[MetricDescriptor] {
        self.catalog.descriptors()
    }

    /// Metrics for every snapshot within the retention window, as of now.
    ///
    /// The stream owns its snapshots, so the cache lock is not held while
    /// translating.
    pub fn collect(&self) -> impl Iterator<Item = OutputMetric> + '_ {
        self.collect_at(Instant::now())
    }

    pub fn collect_at(&self, now: Instant) -> impl Iterator<Item = OutputMetric> + '_ {
        let snapshots = self.cache.snapshots_fresher_than_at(self.retention, now);
        debug!(
            fresh = snapshots.len(),
            cached = self.cache.len(),
            "collecting metrics"
        );
        let catalog: &Catalog = &self.catalog;
        snapshots.into_iter().flat_map(move |snapshot| {
            let label = snapshot.instance_id.clone();
            translate(snapshot, catalog, label)
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache(&self) -> &StatsCache {
        &self.cache
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Periodically drop instances that have been silent for `max_age`.
    pub async fn run_eviction(
        &self,
        interval: Duration,
        max_age: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            interval_secs = interval.as_secs(),
            max_age_secs = max_age.as_secs(),
            "cache eviction started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let evicted = self.cache.evict_older_than(max_age);
                    if evicted > 0 {
                        info!(evicted, remaining = self.cache.len(), "evicted silent instances");
                    }
                }
                _ = shutdown.changed() => {
                    info!("cache eviction shutting down");
                    break;
                }
            }
        }
    }
}
