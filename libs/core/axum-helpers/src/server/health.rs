use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use core_config::AppInfo;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub name: String,
    pub version: String,
}

/// A boxed readiness probe
pub type HealthCheckFuture<'a> = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;

/// Runs the probes concurrently.
///
/// Returns `(all_healthy, name -> "connected" | "disconnected")`.
pub async fn run_health_checks(
    checks: Vec<(&'static str, HealthCheckFuture<'_>)>,
) -> (bool, BTreeMap<&'static str, &'static str>) {
    let (names, futures): (Vec<_>, Vec<_>) = checks.into_iter().unzip();
    let results = join_all(futures).await;

    let mut statuses = BTreeMap::new();
    let mut all_healthy = true;
    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(()) => {
                statuses.insert(name, "connected");
            }
            Err(e) => {
                tracing::error!(check = name, error = %e, "Readiness check failed");
                statuses.insert(name, "disconnected");
                all_healthy = false;
            }
        }
    }

    (all_healthy, statuses)
}

/// Renders readiness probe results as 200 or 503.
pub async fn ready_response(checks: Vec<(&'static str, HealthCheckFuture<'_>)>) -> Response {
    let (ready, services) = run_health_checks(checks).await;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = serde_json::json!({
        "status": if ready { "ready" } else { "not ready" },
        "services": services,
    });
    (status, Json(body)).into_response()
}

async fn health_handler(State(app): State<AppInfo>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        name: app.name.to_string(),
        version: app.version.to_string(),
    })
}

/// `GET /health`: liveness with app name and version.
pub fn health_router(app_info: AppInfo) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(app_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_app_info() {
        let app = health_router(AppInfo {
            name: "taskboard_api",
            version: "1.2.3",
        });
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: HealthResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.version, "1.2.3");
    }

    #[tokio::test]
    async fn test_failed_probe_marks_not_ready() {
        let checks: Vec<(&'static str, HealthCheckFuture<'_>)> = vec![
            ("mongodb", Box::pin(async { Err("timeout".to_string()) })),
            ("memory", Box::pin(async { Ok(()) })),
        ];
        let (ready, statuses) = run_health_checks(checks).await;

        assert!(!ready);
        assert_eq!(statuses["mongodb"], "disconnected");
        assert_eq!(statuses["memory"], "connected");
    }

    #[tokio::test]
    async fn test_ready_response_status() {
        let ok: Vec<(&'static str, HealthCheckFuture<'_>)> =
            vec![("mongodb", Box::pin(async { Ok(()) }))];
        assert_eq!(ready_response(ok).await.status(), StatusCode::OK);

        let failing: Vec<(&'static str, HealthCheckFuture<'_>)> =
            vec![("mongodb", Box::pin(async { Err("down".to_string()) }))];
        assert_eq!(
            ready_response(failing).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
