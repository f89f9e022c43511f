//! jvb-exporter.toml configuration parser.
//!
//! Every section is optional; an empty file yields a working exporter that
//! serves the built-in catalog on `0.0.0.0:9210` with a 30 second retention.

use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, name_prefix};
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub exporter: ExporterSection,
    pub catalog: CatalogSection,
    pub server: ServerSection,
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterSection {
    pub namespace: String,
    pub subsystem: String,
    /// Maximum snapshot age still included in a scrape.
    #[serde(with = "crate::duration_format")]
    pub retention: Duration,
    /// Snapshots older than this are dropped from the cache entirely.
    #[serde(
        deserialize_with = "crate::duration_format::deserialize_option",
        serialize_with = "crate::duration_format::serialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub eviction_after: Option<Duration>,
    #[serde(with = "crate::duration_format")]
    pub eviction_interval: Duration,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            namespace: "jitsi".to_string(),
            subsystem: String::new(),
            retention: Duration::from_secs(30),
            eviction_after: None,
            eviction_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    /// Custom catalog file; the built-in Jitsi catalog is used when absent.
    pub path: Option<PathBuf>,
    /// Overrides the variable label name of every catalog entry.
    pub label: Option<String>,
    pub const_labels: BTreeMap<String, String>,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            path: None,
            label: None,
            const_labels: BTreeMap::from([("app".to_string(), "jitsi".to_string())]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub listen: SocketAddr,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 9210)),
        }
    }
}

/// A bridge instance whose stats endpoint is polled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub id: String,
    pub url: String,
    #[serde(default = "default_poll_interval", with = "crate::duration_format")]
    pub interval: Duration,
    #[serde(default = "default_poll_timeout", with = "crate::duration_format")]
    pub timeout: Duration,
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(5)
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let exporter = &self.exporter;
        if exporter.retention.is_zero() {
            return Err(ConfigError::Invalid("retention must be non-zero".into()));
        }
        if let Some(evict) = exporter.eviction_after {
            if evict < exporter.retention {
                return Err(ConfigError::Invalid(format!(
                    "eviction_after ({}s) must not be shorter than retention ({}s)",
                    evict.as_secs_f64(),
                    exporter.retention.as_secs_f64()
                )));
            }
            if exporter.eviction_interval.is_zero() {
                return Err(ConfigError::Invalid("eviction_interval must be non-zero".into()));
            }
        }

        let mut ids = HashSet::new();
        for target in &self.targets {
            if target.id.is_empty() {
                return Err(ConfigError::Invalid("target id must not be empty".into()));
            }
            if !ids.insert(target.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate target id: {}", target.id)));
            }
            if !target.url.starts_with("http://") {
                return Err(ConfigError::Invalid(format!(
                    "target {} url must start with http://",
                    target.id
                )));
            }
            if target.interval.is_zero() || target.timeout.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "target {} interval and timeout must be non-zero",
                    target.id
                )));
            }
        }
        Ok(())
    }

    /// Prefix applied to every catalog entry.
    pub fn name_prefix(&self) -> String {
        name_prefix(&self.exporter.namespace, &self.exporter.subsystem)
    }

    /// Build the effective catalog: file or built-in, then label settings.
    pub fn load_catalog(&self) -> Result<Catalog, ConfigError> {
        let prefix = self.name_prefix();
        let mut catalog = match &self.catalog.path {
            Some(path) => Catalog::from_file(path, &prefix)?,
            None => Catalog::builtin(&prefix)?,
        };
        if let Some(label) = &self.catalog.label {
            catalog = catalog.with_label_name(label)?;
        }
        Ok(catalog.with_const_labels(self.catalog.const_labels.clone())?)
    }
}
