//! Typed output metrics produced by a collection pass.

use std::collections::BTreeMap;

use jvb_core::{MetricDescriptor, MetricKind};

use crate::buckets::Bucket;
use crate::error::TranslateError;

/// Sample payload of an [`OutputMetric`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Scalar(f64),
    Histogram {
        buckets: Vec<Bucket>,
        count: u64,
        sum: f64,
    },
}

/// One metric ready for exposition.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputMetric {
    pub name: String,
    pub kind: MetricKind,
    /// Variable and constant labels, sorted by name.
    pub labels: Vec<(String, String)>,
    pub value: MetricValue,
}

impl OutputMetric {
    /// Build a metric for `desc`, pairing its label names with `label_values`.
    ///
    /// Fails when the number of values differs from the descriptor's
    /// variable label count.
    pub fn new(
        desc: &MetricDescriptor,
        label_values: &[&str],
        const_labels: &BTreeMap<String, String>,
        value: MetricValue,
    ) -> Result<Self, TranslateError> {
        if desc.label_names.len() != label_values.len() {
            return Err(TranslateError::LabelCardinality {
                metric: desc.name.clone(),
                expected: desc.label_names.len(),
                got: label_values.len(),
            });
        }

        let mut labels: Vec<(String, String)> = desc
            .label_names
            .iter()
            .zip(label_values)
            .map(|(name, value)| (name.clone(), value.to_string()))
            .chain(const_labels.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect();
        labels.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(Self {
            name: desc.name.clone(),
            kind: desc.kind,
            labels,
            value,
        })
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn scalar(&self) -> Option<f64> {
        match self.value {
            MetricValue::Scalar(v) => Some(v),
            MetricValue::Histogram { .. } => None,
        }
    }
}
