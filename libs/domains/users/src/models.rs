use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User entity as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Lowercase, unique
    pub email: String,
    /// Argon2id PHC string (never exposed in API responses)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now().trunc_subsecs(3);
        Self {
            id: Uuid::now_v7(),
            username,
            email: email.to_lowercase(),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Registration body. Missing fields deserialize as empty so they are
/// reported as violations.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"))]
    #[schema(example = "alice")]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    #[schema(example = "Sup3r$ecret")]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Payload of register and login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthData {
    /// Bearer token for `Authorization: Bearer <token>`
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsersData {
    pub users: Vec<UserResponse>,
}
