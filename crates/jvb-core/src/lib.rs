pub mod catalog;
pub mod colibri;
pub mod config;
pub mod duration_format;
pub mod error;
pub mod types;

pub use catalog::{Catalog, MetricDescriptor, name_prefix};
pub use config::{ExporterConfig, TargetConfig};
pub use error::{CatalogError, CatalogResult, ConfigError, PayloadError};
pub use types::*;
