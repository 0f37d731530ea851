//! Readiness endpoint

use axum::{Router, extract::State, response::Response, routing::get};
use axum_helpers::{HealthCheckFuture, ready_response};
use database::mongodb::{Client, check_health};

/// `GET /ready`. Pings MongoDB when it backs the store.
pub fn router(mongo_client: Option<Client>) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(mongo_client)
}

async fn readiness_check(State(mongo_client): State<Option<Client>>) -> Response {
    let mut checks: Vec<(&'static str, HealthCheckFuture<'_>)> = Vec::new();
    if let Some(client) = &mongo_client {
        checks.push((
            "mongodb",
            Box::pin(async move {
                if check_health(client).await {
                    Ok(())
                } else {
                    Err("ping failed".to_string())
                }
            }),
        ));
    }
    ready_response(checks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_memory_store_is_always_ready() {
        let response = router(None)
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ready");
    }
}
