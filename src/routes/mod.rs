//! HTTP surface

pub mod health;
pub mod metrics;
pub mod refresh;
pub mod report;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Application routes, without middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health and metrics (Kubernetes probes + Prometheus)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(metrics::prometheus_metrics))
        // Dashboard
        .route("/api/v1/report", get(report::get_report))
        .route("/api/v1/refresh", post(refresh::refresh))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientLookup;
    use crate::services::report_source::testing::FixedReportSource;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(source: Arc<FixedReportSource>) -> Router {
        let lookup: ClientLookup = [(5, "hhrd".to_string()), (6, "oak".to_string())]
            .into_iter()
            .collect();
        router(AppState::new(source, Duration::from_secs(3600), lookup))
    }

    fn document() -> String {
        json!({"issues": [
            {"id": 1, "module_name": "Fees", "reported_date": "2024-01-05T08:00:00Z",
             "status": "resolved", "host": 5},
            {"id": 2, "module_name": "Fees", "reported_date": "2024-02-05T08:00:00Z",
             "status": "inprogress", "assigned_to": "dev", "host": 6},
            {"id": 3, "module_name": "Exams", "reported_date": "2024-03-05T08:00:00Z",
             "resolved": false, "host": 99},
        ]})
        .to_string()
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_report_all_clients() {
        let source = Arc::new(FixedReportSource::new(document()));
        let (status, body) = send(app(source), "GET", "/api/v1/report").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["kpis"]["total"], 3);
        assert_eq!(body["available_clients"], json!(["Unknown", "hhrd", "oak"]));
    }

    #[tokio::test]
    async fn test_report_filtered_by_client() {
        let source = Arc::new(FixedReportSource::new(document()));
        let (_, body) = send(app(source), "GET", "/api/v1/report?clients=oak").await;

        assert_eq!(body["kpis"]["total"], 1);
        assert_eq!(body["kpis"]["inprogress"], 1);
        assert_eq!(body["selection"]["values"], json!(["oak"]));
    }

    #[tokio::test]
    async fn test_report_empty_selection_is_no_data() {
        let source = Arc::new(FixedReportSource::new(document()));
        let (status, body) = send(app(source), "GET", "/api/v1/report?clients=").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_data");
        assert_eq!(body["kpis"]["total"], 0);
    }

    #[tokio::test]
    async fn test_report_source_down_is_empty_report() {
        let source = Arc::new(FixedReportSource::failing("connection refused"));
        let (status, body) = send(app(source), "GET", "/api/v1/report").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "data_unavailable");
        assert_eq!(body["issues"], json!([]));
    }

    #[tokio::test]
    async fn test_report_bad_query_is_rejected() {
        let source = Arc::new(FixedReportSource::new(document()));
        let (status, body) = send(app(source), "GET", "/api/v1/report?clients=a&hosts=5").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
    }

    #[tokio::test]
    async fn test_refresh_refetches() {
        let source = Arc::new(FixedReportSource::new(document()));
        let app = app(Arc::clone(&source));

        send(app.clone(), "GET", "/api/v1/report").await;
        send(app.clone(), "GET", "/api/v1/report").await;
        assert_eq!(source.fetches(), 1);

        let (status, body) = send(app.clone(), "POST", "/api/v1/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["refreshed"], true);
        assert_eq!(body["records"], 3);
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_ready_reflects_source() {
        let healthy = Arc::new(FixedReportSource::new(document()));
        let (status, _) = send(app(healthy), "GET", "/ready").await;
        assert_eq!(status, StatusCode::OK);

        let down = Arc::new(FixedReportSource::failing("down"));
        let (status, body) = send(app(down), "GET", "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not_ready");
    }
}
