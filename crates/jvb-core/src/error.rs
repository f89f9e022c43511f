//! Error types for catalog and configuration loading.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while building a metric catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid metric name: {0:?}")]
    InvalidName(String),

    #[error("invalid label name {label:?} on metric {metric}")]
    InvalidLabel { metric: String, label: String },

    #[error("duplicate metric name: {0}")]
    Duplicate(String),
}

/// Errors raised while loading or validating the exporter config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Errors raised while decoding a stats payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object or a list of {{name, value}} entries")]
    UnexpectedShape,
}
