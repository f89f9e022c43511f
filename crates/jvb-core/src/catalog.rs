//! Metric catalog: the fixed table of descriptors stats are matched against.
//!
//! A catalog is built once from TOML (`[[metric]]` tables) and never changes
//! afterwards. Every descriptor name is stored with the exporter's name
//! prefix already applied, so `describe` output can be used verbatim.
//!
//! ```toml
//! [[metric]]
//! name = "participants"
//! kind = "gauge"
//! help = "The current number of participants."
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::types::MetricKind;

/// Label carrying the instance identifier when a descriptor names none.
pub const DEFAULT_LABEL: &str = "instance";

/// Bucket bound label added to every histogram sample at render time.
const BUCKET_LABEL: &str = "le";

const BUILTIN_CATALOG: &str = include_str!("../catalog/jvb.toml");

static METRIC_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").expect("static regex"));
static LABEL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("static regex"));

/// One entry of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub name: String,
    pub kind: MetricKind,
    pub help: String,
    /// Variable label names. The translator fills exactly one value in.
    #[serde(rename = "labels", default = "default_labels")]
    pub label_names: Vec<String>,
}

impl MetricDescriptor {
    pub fn new(name: impl Into<String>, kind: MetricKind, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            help: help.into(),
            label_names: default_labels(),
        }
    }
}

fn default_labels() -> Vec<String> {
    vec![DEFAULT_LABEL.to_string()]
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(rename = "metric", default)]
    metrics: Vec<MetricDescriptor>,
}

/// Immutable, prefixed set of metric descriptors.
#[derive(Debug, Clone)]
pub struct Catalog {
    prefix: String,
    descriptors: Vec<MetricDescriptor>,
    /// Unprefixed stat name → index into `descriptors`.
    by_stat: HashMap<String, usize>,
    const_labels: BTreeMap<String, String>,
}

impl Catalog {
    /// Build a catalog from unprefixed descriptors, applying `prefix` to each.
    pub fn new(prefix: &str, descriptors: Vec<MetricDescriptor>) -> CatalogResult<Self> {
        let mut by_stat = HashMap::with_capacity(descriptors.len());
        let mut prefixed = Vec::with_capacity(descriptors.len());

        for (idx, mut d) in descriptors.into_iter().enumerate() {
            let stat_name = d.name.clone();
            d.name = format!("{prefix}{stat_name}");

            if !METRIC_NAME.is_match(&d.name) {
                return Err(CatalogError::InvalidName(d.name));
            }
            let mut seen = HashSet::new();
            for label in &d.label_names {
                if !label_allowed(&d, label) || !seen.insert(label) {
                    return Err(CatalogError::InvalidLabel {
                        metric: d.name.clone(),
                        label: label.clone(),
                    });
                }
            }
            if by_stat.insert(stat_name, idx).is_some() {
                return Err(CatalogError::Duplicate(d.name));
            }
            prefixed.push(d);
        }

        Ok(Self {
            prefix: prefix.to_string(),
            descriptors: prefixed,
            by_stat,
            const_labels: BTreeMap::new(),
        })
    }

    /// The Jitsi Videobridge catalog shipped with the exporter.
    pub fn builtin(prefix: &str) -> CatalogResult<Self> {
        Self::from_toml_str(BUILTIN_CATALOG, prefix)
    }

    pub fn from_toml_str(content: &str, prefix: &str) -> CatalogResult<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(prefix, file.metrics)
    }

    pub fn from_file(path: &Path, prefix: &str) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, prefix)
    }

    /// Replace every descriptor's variable labels with the single `label`.
    pub fn with_label_name(mut self, label: &str) -> CatalogResult<Self> {
        if !label_name_valid(label) {
            return Err(CatalogError::InvalidLabel {
                metric: "*".to_string(),
                label: label.to_string(),
            });
        }
        if let Some(d) = self.descriptors.iter().find(|d| !label_allowed(d, label)) {
            return Err(CatalogError::InvalidLabel {
                metric: d.name.clone(),
                label: label.to_string(),
            });
        }
        for d in &mut self.descriptors {
            d.label_names = vec![label.to_string()];
        }
        Ok(self)
    }

    /// Attach constant labels to every sample emitted for this catalog.
    pub fn with_const_labels(mut self, labels: BTreeMap<String, String>) -> CatalogResult<Self> {
        for label in labels.keys() {
            if !label_name_valid(label) {
                return Err(CatalogError::InvalidLabel {
                    metric: "*".to_string(),
                    label: label.clone(),
                });
            }
            let rejected = self
                .descriptors
                .iter()
                .find(|d| d.label_names.contains(label) || !label_allowed(d, label));
            if let Some(d) = rejected {
                return Err(CatalogError::InvalidLabel {
                    metric: d.name.clone(),
                    label: label.clone(),
                });
            }
        }
        self.const_labels = labels;
        Ok(self)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn descriptors(&self) -> &[MetricDescriptor] {
        &self.descriptors
    }

    pub fn const_labels(&self) -> &BTreeMap<String, String> {
        &self.const_labels
    }

    /// Find the descriptor whose name equals `prefix + stat_name`.
    pub fn lookup(&self, stat_name: &str) -> Option<&MetricDescriptor> {
        self.by_stat.get(stat_name).map(|&idx| &self.descriptors[idx])
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Render the effective catalog back to TOML (names prefixed).
    pub fn to_toml_string(&self) -> CatalogResult<String> {
        let file = CatalogFile {
            metrics: self.descriptors.clone(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }
}

/// Whether `label` may appear on samples of `desc`.
fn label_allowed(desc: &MetricDescriptor, label: &str) -> bool {
    label_name_valid(label) && !(desc.kind.is_histogram() && label == BUCKET_LABEL)
}

fn label_name_valid(label: &str) -> bool {
    LABEL_NAME.is_match(label) && !label.starts_with("__")
}

/// Derive the metric name prefix from optional subsystem and namespace.
///
/// Subsystem comes first, then namespace, each followed by `_` when set.
/// This keeps metric names identical to the ones existing dashboards use.
pub fn name_prefix(namespace: &str, subsystem: &str) -> String {
    let mut prefix = String::new();
    if !subsystem.is_empty() {
        prefix.push_str(subsystem);
        prefix.push('_');
    }
    if !namespace.is_empty() {
        prefix.push_str(namespace);
        prefix.push('_');
    }
    prefix
}
