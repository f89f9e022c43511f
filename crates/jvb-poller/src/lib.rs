//! jvb-poller: pulls stats from bridge instances.
//!
//! Each configured target gets a background task that fetches its Colibri
//! stats endpoint on an interval and feeds the payload into the
//! `StatsCollector`. Failed fetches leave the cached snapshot alone; it
//! simply ages out of the retention window.
//!
//! # Architecture
//!
//! ```text
//! StatsPoller
//!   └── Per-target background task
//!       ├── PollTracker (consecutive failures, backoff)
//!       ├── fetch_stats() → Vec<RawStat>
//!       └── StatsCollector::update()
//! ```
//!
//! Exponential backoff (interval → 60s) keeps an unreachable bridge from
//! being hammered. A single successful fetch resets it.

pub mod error;
pub mod fetch;
pub mod poller;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use error::PollError;
pub use fetch::fetch_stats;
pub use poller::StatsPoller;
pub use tracker::PollTracker;
