use super::jwt::{JwtAuth, JwtClaims, TokenError};
use crate::errors::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// The authenticated caller, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Turns verified token claims into a live identity.
///
/// Implementations decide whether the subject still exists.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, claims: &JwtClaims) -> Result<AuthUser, AppError>;
}

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtAuth,
    pub resolver: Arc<dyn IdentityResolver>,
}

impl AuthState {
    pub fn new(jwt: JwtAuth, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { jwt, resolver }
    }
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects the request with 401 unless it carries a valid bearer token for
/// a user that still exists. On success the [`AuthUser`] is inserted into
/// request extensions.
pub async fn jwt_auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = {
        let token = bearer_token(request.headers())
            .ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))?;

        auth.jwt.verify_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            match e {
                TokenError::Expired => AppError::Unauthorized("Token expired".to_string()),
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })?
    };

    let user = auth.resolver.resolve(&claims).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
