//! Shared types used across the bridge crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller-chosen identifier of a reporting bridge instance.
pub type InstanceId = String;

/// A single self-reported measurement, exactly as the bridge sent it.
///
/// `value` is left unparsed: a decimal number for scalar stats, or a
/// bracketed list such as `"[3,1,0,2]"` for histogram stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStat {
    pub name: String,
    pub value: String,
}

impl RawStat {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Exposition type of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
    Untyped,
    /// Raw value is a per-bucket count list, exposed as a cumulative histogram.
    Histogram,
}

impl MetricKind {
    /// The `# TYPE` keyword used in the text exposition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
            MetricKind::Untyped => "untyped",
            MetricKind::Histogram => "histogram",
        }
    }

    pub fn is_histogram(&self) -> bool {
        matches!(self, MetricKind::Histogram)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
