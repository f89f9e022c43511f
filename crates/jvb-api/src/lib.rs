//! jvb-api: HTTP surface of the JVB exporter.
//!
//! Serves the Prometheus scrape endpoint plus a small REST API for
//! inspecting the stats cache and pushing stats from bridges that cannot
//! be polled.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/healthz` | Liveness |
//! | GET | `/api/v1/instances` | Cached instances with age and freshness |
//! | PUT | `/api/v1/instances/{id}/stats` | Push a stats payload |
//! | DELETE | `/api/v1/instances/{id}` | Drop an instance's snapshot |
//! | GET | `/api/v1/catalog` | Metric descriptors |

pub mod handlers;

use axum::Router;
use axum::routing::{delete, get, put};
use jvb_metrics::StatsCollector;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub collector: StatsCollector,
}

/// Build the complete router (REST + metrics + health).
pub fn build_router(collector: StatsCollector) -> Router {
    let state = ApiState { collector };

    let api_routes = Router::new()
        .route("/instances", get(handlers::list_instances))
        .route("/instances/{id}", delete(handlers::delete_instance))
        .route("/instances/{id}/stats", put(handlers::push_stats))
        .route("/catalog", get(handlers::get_catalog))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::prometheus_metrics).with_state(state))
        .route("/healthz", get(handlers::healthz))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use jvb_core::Catalog;
    use tower::ServiceExt;

    use super::*;

    fn router() -> (Router, StatsCollector) {
        let catalog = Catalog::builtin("jitsi_").unwrap();
        let collector = StatsCollector::new(catalog, Duration::from_secs(30));
        (build_router(collector.clone()), collector)
    }

    #[tokio::test]
    async fn routes_are_mounted() {
        let (router, _) = router();
        for uri in ["/metrics", "/healthz", "/api/v1/instances", "/api/v1/catalog"] {
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let resp = router.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "GET {uri}");
        }

        let req = Request::builder().uri("/api/v1/nope").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn push_route_updates_collector() {
        let (router, collector) = router();

        let req = Request::builder()
            .method("PUT")
            .uri("/api/v1/instances/jvb-7/stats")
            .header("content-type", "application/json")
            .body(Body::from(r#"[{"name": "participants", "value": "2"}]"#))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(collector.cache().get("jvb-7").is_some());

        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains(r#"jitsi_participants{instance="jvb-7"} 2"#));
    }

    #[tokio::test]
    async fn push_route_rejects_invalid_json() {
        let (router, collector) = router();
        let req = Request::builder()
            .method("PUT")
            .uri("/api/v1/instances/jvb-7/stats")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
        assert!(collector.cache().is_empty());
    }

    #[tokio::test]
    async fn get_on_push_route_is_not_allowed() {
        let (router, _) = router();
        let req = Request::builder()
            .uri("/api/v1/instances/jvb-7/stats")
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
