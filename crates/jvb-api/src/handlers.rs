//! REST API handlers.
//!
//! Each handler goes through the shared `StatsCollector` and returns JSON,
//! except `/metrics` which returns the Prometheus text format.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{debug, info};

use jvb_core::MetricDescriptor;
use jvb_core::colibri::stats_from_json;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Instances ──────────────────────────────────────────────────

/// One cached bridge, as reported by `GET /api/v1/instances`.
#[derive(Debug, serde::Serialize)]
pub struct InstanceSummary {
    pub id: String,
    pub age_secs: f64,
    pub fresh: bool,
    pub stats: usize,
}

/// GET /api/v1/instances
pub async fn list_instances(State(state): State<ApiState>) -> impl IntoResponse {
    let now = Instant::now();
    let retention = state.collector.retention();
    let mut instances: Vec<InstanceSummary> = state
        .collector
        .cache()
        .all()
        .iter()
        .map(|snapshot| InstanceSummary {
            id: snapshot.instance_id.clone(),
            age_secs: snapshot.age_at(now).as_secs_f64(),
            fresh: snapshot.is_fresh_at(retention, now),
            stats: snapshot.stats.len(),
        })
        .collect();
    instances.sort_by(|a, b| a.id.cmp(&b.id));
    ApiResponse::ok(instances)
}

/// PUT /api/v1/instances/:id/stats
///
/// Accepts the Colibri object form or a `[{name, value}]` list.
pub async fn push_stats(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    if id.trim().is_empty() {
        return error_response("instance id must not be empty", StatusCode::BAD_REQUEST)
            .into_response();
    }
    match stats_from_json(body) {
        Ok(stats) => {
            let count = stats.len();
            state.collector.update(id.clone(), stats);
            debug!(instance = %id, stats = count, "stats pushed");
            ApiResponse::ok(serde_json::json!({
                "instance": id,
                "stats": count,
            }))
            .into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response(),
    }
}

/// DELETE /api/v1/instances/:id
pub async fn delete_instance(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.collector.cache().remove(&id) {
        info!(instance = %id, "instance removed");
        ApiResponse::ok("deleted").into_response()
    } else {
        error_response("instance not found", StatusCode::NOT_FOUND).into_response()
    }
}

// ── Catalog ────────────────────────────────────────────────────

#[derive(Debug, serde::Serialize)]
pub struct CatalogView<'a> {
    pub prefix: &'a str,
    pub const_labels: &'a BTreeMap<String, String>,
    pub metrics: &'a [MetricDescriptor],
}

/// GET /api/v1/catalog
pub async fn get_catalog(State(state): State<ApiState>) -> impl IntoResponse {
    let catalog = state.collector.catalog();
    ApiResponse::ok(CatalogView {
        prefix: catalog.prefix(),
        const_labels: catalog.const_labels(),
        metrics: catalog.descriptors(),
    })
    .into_response()
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("ok")
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = jvb_metrics::render_prometheus(
        state.collector.describe(),
        state.collector.collect(),
    );
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use http_body_util::BodyExt;
    use jvb_core::{Catalog, RawStat};
    use jvb_metrics::StatsCollector;

    fn test_state() -> ApiState {
        let catalog = Catalog::builtin("jitsi_").unwrap();
        ApiState {
            collector: StatsCollector::new(catalog, Duration::from_secs(30)),
        }
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn list_instances_empty() {
        let state = test_state();
        let resp = list_instances(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn push_then_list() {
        let state = test_state();
        let resp = push_stats(
            State(state.clone()),
            Path("jvb-1".to_string()),
            Json(serde_json::json!({"participants": 4, "threads": 30})),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(list_instances(State(state)).await.into_response()).await;
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], "jvb-1");
        assert_eq!(data[0]["fresh"], true);
        assert_eq!(data[0]["stats"], 2);
    }

    #[tokio::test]
    async fn push_rejects_scalar_body() {
        let state = test_state();
        let resp = push_stats(
            State(state.clone()),
            Path("jvb-1".to_string()),
            Json(serde_json::json!(12)),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(state.collector.cache().is_empty());
    }

    #[tokio::test]
    async fn delete_existing_and_missing() {
        let state = test_state();
        state.collector.update("jvb-1", vec![RawStat::new("participants", "1")]);

        let resp = delete_instance(State(state.clone()), Path("jvb-1".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = delete_instance(State(state), Path("jvb-1".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn catalog_lists_descriptors() {
        let state = test_state();
        let json = body_json(get_catalog(State(state)).await.into_response()).await;
        assert_eq!(json["data"]["prefix"], "jitsi_");
        assert_eq!(json["data"]["metrics"].as_array().unwrap().len(), 62);
    }

    #[tokio::test]
    async fn prometheus_endpoint_returns_text() {
        let state = test_state();
        state.collector.update("jvb-1", vec![RawStat::new("participants", "9")]);

        let resp = prometheus_metrics(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("# TYPE jitsi_participants gauge"));
        assert!(text.contains("jitsi_participants{"));
        assert!(text.contains("instance=\"jvb-1\""));
    }
}
