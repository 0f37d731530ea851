//! Bearer-token authentication.
//!
//! [`JwtAuth`] signs and verifies HS256 tokens. [`jwt_auth_middleware`]
//! verifies the `Authorization: Bearer` header and asks an
//! [`IdentityResolver`] to turn the claims into an [`AuthUser`], which is
//! placed in the request extensions for handlers.
//!
//! ```ignore
//! let auth = AuthState::new(JwtAuth::new(&JwtConfig::from_env()?), Arc::new(user_service));
//! let protected = Router::new()
//!     .route("/tasks", get(list_tasks))
//!     .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use jwt::{DEFAULT_TOKEN_TTL_SECS, JwtAuth, JwtClaims, TokenError};
pub use middleware::{AuthState, AuthUser, IdentityResolver, bearer_token, jwt_auth_middleware};
