//! # Axum Helpers
//!
//! Shared HTTP plumbing for the taskboard services.
//!
//! - **[`response`]**: the `{ success, message, data }` envelope
//! - **[`errors`]**: [`AppError`], error codes and the error envelope
//! - **[`extractors`]**: JSON, query and path extractors with enveloped rejections
//! - **[`auth`]**: HS256 bearer tokens and the authentication middleware
//! - **[`http`]**: CORS and security headers
//! - **[`server`]**: router assembly, health checks, graceful shutdown
//!
//! ```ignore
//! let router = create_router::<ApiDoc>(api_routes, &CorsConfig::from_env(&env)?)?
//!     .merge(health_router(app_info!()));
//! create_production_app(router, &server_config, Duration::from_secs(30), async {}).await?;
//! ```

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod response;
pub mod server;

pub use auth::{
    AuthState, AuthUser, IdentityResolver, JwtAuth, JwtClaims, JwtConfig, TokenError,
    jwt_auth_middleware,
};
pub use errors::{AppError, ErrorCode, ErrorResponse, FieldViolation};
pub use extractors::{ApiJson, ApiQuery, UuidPath};
pub use http::{CorsConfig, create_cors_layer, security_headers};
pub use response::{ApiResponse, MessageResponse};
pub use server::{
    HealthCheckFuture, ShutdownCoordinator, create_production_app, create_router, health_router,
    ready_response, run_health_checks, shutdown_signal,
};
