use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    ApiJson, ApiResponse, AuthState, AuthUser,
    errors::responses::{
        BadRequestValidationResponse, InternalServerErrorResponse, UnauthorizedResponse,
    },
    jwt_auth_middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{AuthData, LoginRequest, RegisterRequest, UserResponse, UsersData};
use crate::repository::UserRepository;
use crate::service::UserService;

pub const TAG: &str = "auth";

/// OpenAPI documentation for the Auth API
#[derive(OpenApi)]
#[openapi(
    paths(register, login, list_users),
    components(
        schemas(RegisterRequest, LoginRequest, AuthData, UsersData, UserResponse),
        responses(BadRequestValidationResponse, UnauthorizedResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = TAG, description = "Registration, login and users")
    )
)]
pub struct ApiDoc;

/// Auth routes. `/users` requires a bearer token verified through `auth`.
pub fn router<R: UserRepository + 'static>(service: UserService<R>, auth: AuthState) -> Router {
    let shared_service = Arc::new(service);

    let protected = Router::new()
        .route("/users", get(list_users))
        .route_layer(middleware::from_fn_with_state(auth, jwt_auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
        .with_state(shared_service)
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AuthData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ApiJson(input): ApiJson<RegisterRequest>,
) -> UserResult<impl IntoResponse> {
    let data = service.register(input).await?;
    Ok(ApiResponse::ok("User registered successfully", data).with_status(StatusCode::CREATED))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthData>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ApiJson(input): ApiJson<LoginRequest>,
) -> UserResult<impl IntoResponse> {
    let data = service.login(input).await?;
    Ok(ApiResponse::ok("Login successful", data))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<UsersData>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    caller: AuthUser,
) -> UserResult<impl IntoResponse> {
    tracing::debug!(requested_by = %caller.id, "Listing users");
    let users = service.list_users().await?;
    Ok(ApiResponse::ok("Users retrieved successfully", UsersData { users }))
}
