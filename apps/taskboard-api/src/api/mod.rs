//! API routes module
//!
//! Everything here is nested under `/api` by `axum_helpers::create_router`.

pub mod health;

use axum::{Router, middleware};
use axum_helpers::{AuthState, JwtAuth, jwt_auth_middleware};
use domain_tasks::{TaskRepository, TaskService};
use domain_users::{UserRepository, UserService};
use std::sync::Arc;

/// Builds `/tasks` (bearer token required) and `/auth`.
pub fn routes<T, U>(tasks: T, users: U, jwt: JwtAuth) -> Router
where
    T: TaskRepository + 'static,
    U: UserRepository + Clone + 'static,
{
    let user_service = UserService::new(users, jwt.clone());
    let auth = AuthState::new(jwt, Arc::new(user_service.clone()));

    let tasks = domain_tasks::handlers::router(TaskService::new(tasks))
        .route_layer(middleware::from_fn_with_state(auth.clone(), jwt_auth_middleware));

    Router::new()
        .nest("/tasks", tasks)
        .nest("/auth", domain_users::handlers::router(user_service, auth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum_helpers::JwtConfig;
    use domain_tasks::InMemoryTaskRepository;
    use domain_users::InMemoryUserRepository;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const SECRET: &str = "routes-test-secret-with-32-plus-chars";

    fn app() -> Router {
        let jwt = JwtAuth::new(&JwtConfig::new(SECRET));
        routes(
            InMemoryTaskRepository::new(),
            InMemoryUserRepository::new(),
            jwt,
        )
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn register(app: &Router) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/auth/register",
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "Sup3r$ecret"
            })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_tasks_require_token() {
        let app = app();
        let (status, body) = send(&app, "GET", "/tasks", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Access token required");
    }

    #[tokio::test]
    async fn test_registered_user_manages_tasks() {
        let app = app();
        let token = register(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/tasks",
            Some(json!({ "title": "Write docs", "assignedUser": "alice" })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["task"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", &format!("/tasks/{id}"), None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["task"]["title"], "Write docs");

        let (status, body) = send(&app, "GET", "/tasks/stats", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["stats"]["total"], 1);
    }

    #[tokio::test]
    async fn test_auth_routes_stay_public() {
        let app = app();
        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": "whatever" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = register(&app).await;
        let (status, body) = send(&app, "GET", "/auth/users", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["users"].as_array().unwrap().len(), 1);
    }
}
