//! HTTP fetch of a bridge's stats document.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Limited};
use tracing::debug;

use jvb_core::RawStat;
use jvb_core::colibri::stats_from_slice;

use crate::error::PollError;

/// Upper bound on the size of a stats document.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Fetch `url` and decode it as a Colibri stats document.
///
/// The whole exchange, connect included, is bounded by `timeout`.
pub async fn fetch_stats(url: &str, timeout: Duration) -> Result<Vec<RawStat>, PollError> {
    let uri: http::Uri = url.parse().map_err(|e: http::uri::InvalidUri| PollError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let host = uri.host().ok_or_else(|| PollError::InvalidUrl {
        url: url.to_string(),
        reason: "missing host".to_string(),
    })?;
    let address = format!("{host}:{}", uri.port_u16().unwrap_or(80));

    match tokio::time::timeout(timeout, fetch_inner(&uri, &address)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(%url, "stats fetch timed out");
            Err(PollError::Timeout(timeout))
        }
    }
}

async fn fetch_inner(uri: &http::Uri, address: &str) -> Result<Vec<RawStat>, PollError> {
    let stream = tokio::net::TcpStream::connect(address)
        .await
        .map_err(|source| PollError::Connect {
            address: address.to_string(),
            source,
        })?;

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let host_header = uri.authority().map(|a| a.as_str()).unwrap_or(address);
    let req = http::Request::builder()
        .method("GET")
        .uri(path)
        .header("host", host_header)
        .header("accept", "application/json")
        .header("user-agent", "jvb-poller/0.1")
        .body(Empty::<Bytes>::new())?;

    let resp = sender.send_request(req).await?;
    if !resp.status().is_success() {
        return Err(PollError::Status(resp.status()));
    }

    let body = Limited::new(resp.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| PollError::Body(e.to_string()))?
        .to_bytes();

    Ok(stats_from_slice(&body)?)
}
