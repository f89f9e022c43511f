//! jvb-metrics: turns cached bridge stats into Prometheus metrics.
//!
//! Holds the most recent stats snapshot per bridge instance, translates
//! fresh snapshots against the metric catalog on every scrape, and renders
//! the result in the Prometheus text exposition format.
//!
//! # Architecture
//!
//! ```text
//! StatsCollector
//!   ├── update() ← called per received stats payload
//!   │     └── StatsCache (one Arc<Snapshot> per instance)
//!   ├── describe() → catalog descriptors, no values
//!   ├── collect() → fresh snapshots → translate() → OutputMetric stream
//!   │     └── buckets::transform() for histogram stats
//!   └── run_eviction() → periodic removal of long-dead instances
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod buckets;
pub mod cache;
pub mod collector;
pub mod error;
pub mod metric;
pub mod prometheus;
pub mod translator;

pub use buckets::{Bucket, CumulativeHistogram};
pub use cache::{Snapshot, StatsCache};
pub use collector::StatsCollector;
pub use error::TranslateError;
pub use metric::{MetricValue, OutputMetric};
pub use prometheus::render_prometheus;
pub use translator::translate;
