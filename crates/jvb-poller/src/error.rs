use std::time::Duration;

use thiserror::Error;

use jvb_core::PayloadError;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("invalid target url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("connection to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),

    #[error("unexpected status {0}")]
    Status(http::StatusCode),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}
