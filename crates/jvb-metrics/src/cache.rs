//! Stats cache: most recent snapshot per bridge instance.
//!
//! Freshness is a read-time filter: a snapshot that falls out of the
//! retention window stays stored and becomes visible again as soon as its
//! instance reports. Only `evict_older_than` and `remove` delete entries.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use jvb_core::{InstanceId, RawStat};

/// The last stats payload received from one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub instance_id: InstanceId,
    pub last_updated: Instant,
    pub stats: Vec<RawStat>,
}

impl Snapshot {
    /// Age of the snapshot relative to `now` (zero if `now` is earlier).
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_updated)
    }

    /// Whether the snapshot is within `retention` of `now`, inclusive.
    pub fn is_fresh_at(&self, retention: Duration, now: Instant) -> bool {
        self.age_at(now) <= retention
    }
}

type SnapshotMap = HashMap<InstanceId, Arc<Snapshot>>;

/// Shared, lock-protected map of instance → snapshot.
///
/// `Clone` hands out another handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct StatsCache {
    snapshots: Arc<RwLock<SnapshotMap>>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the snapshot for `instance_id`, stamped now.
    pub fn update(&self, instance_id: impl Into<InstanceId>, stats: Vec<RawStat>) {
        self.update_at(instance_id, stats, Instant::now());
    }

    /// Insert or replace the snapshot for `instance_id` with an explicit timestamp.
    pub fn update_at(&self, instance_id: impl Into<InstanceId>, stats: Vec<RawStat>, now: Instant) {
        let instance_id = instance_id.into();
        let snapshot = Arc::new(Snapshot {
            instance_id: instance_id.clone(),
            last_updated: now,
            stats,
        });

        let mut snapshots = self.write();
        if snapshots.insert(instance_id.clone(), snapshot).is_none() {
            debug!(instance = %instance_id, "new instance cached");
        }
    }

    /// Every snapshot whose age is at most `retention`.
    pub fn snapshots_fresher_than(&self, retention: Duration) -> Vec<Arc<Snapshot>> {
        self.snapshots_fresher_than_at(retention, Instant::now())
    }

    pub fn snapshots_fresher_than_at(&self, retention: Duration, now: Instant) -> Vec<Arc<Snapshot>> {
        self.read()
            .values()
            .filter(|s| s.is_fresh_at(retention, now))
            .cloned()
            .collect()
    }

    /// Every stored snapshot, fresh or not.
    pub fn all(&self) -> Vec<Arc<Snapshot>> {
        self.read().values().cloned().collect()
    }

    pub fn get(&self, instance_id: &str) -> Option<Arc<Snapshot>> {
        self.read().get(instance_id).cloned()
    }

    /// Drop one instance. Returns whether it was present.
    pub fn remove(&self, instance_id: &str) -> bool {
        let removed = self.write().remove(instance_id).is_some();
        if removed {
            debug!(instance = %instance_id, "instance removed from cache");
        }
        removed
    }

    /// Remove snapshots strictly older than `max_age`. Returns the count removed.
    pub fn evict_older_than(&self, max_age: Duration) -> usize {
        self.evict_older_than_at(max_age, Instant::now())
    }

    pub fn evict_older_than_at(&self, max_age: Duration, now: Instant) -> usize {
        let mut snapshots = self.write();
        let before = snapshots.len();
        snapshots.retain(|_, s| s.age_at(now) <= max_age);
        before - snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Writers replace whole entries, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, SnapshotMap> {
        self.snapshots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SnapshotMap> {
        self.snapshots.write().unwrap_or_else(PoisonError::into_inner)
    }
}
