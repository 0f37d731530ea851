use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum_helpers::{AppError, AuthUser, FieldViolation, IdentityResolver, JwtAuth, JwtClaims};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{AuthData, LoginRequest, RegisterRequest, User, UserResponse};
use crate::repository::UserRepository;

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Registration, login and token-subject lookup.
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    jwt: JwtAuth,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R, jwt: JwtAuth) -> Self {
        Self {
            repository: Arc::new(repository),
            jwt,
        }
    }

    /// Creates the account and signs a token for it.
    #[instrument(skip(self, input), fields(username = %input.username.trim()))]
    pub async fn register(&self, input: RegisterRequest) -> UserResult<AuthData> {
        let input = RegisterRequest {
            username: input.username.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            password: input.password,
        };
        validate_registration(&input).map_err(UserError::Validation)?;

        if self.repository.get_by_email(&input.email).await?.is_some() {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let password = input.password;
        let password_hash = off_runtime(move || hash_password(&password)).await?;
        let user = self
            .repository
            .create(User::new(input.username, input.email, password_hash))
            .await?;

        info!(user_id = %user.id, "User registered");
        self.auth_data(user)
    }

    /// Unknown email and wrong password fail the same way.
    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginRequest) -> UserResult<AuthData> {
        input
            .validate()
            .map_err(|e| UserError::Validation(FieldViolation::from_validation_errors(&e)))?;

        let email = input.email.trim().to_lowercase();
        let Some(user) = self.repository.get_by_email(&email).await? else {
            warn!("Login failed: unknown email");
            return Err(UserError::InvalidCredentials);
        };

        let password = input.password;
        let stored_hash = user.password_hash.clone();
        if !off_runtime(move || verify_password(&password, &stored_hash)).await? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(UserError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        self.auth_data(user)
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> UserResult<Vec<UserResponse>> {
        let users = self.repository.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    fn auth_data(&self, user: User) -> UserResult<AuthData> {
        let token = self
            .jwt
            .issue_token(&user.id.to_string(), &user.username, &user.email)
            .map_err(|e| UserError::Token(e.to_string()))?;

        Ok(AuthData {
            token,
            user: user.into(),
        })
    }
}

/// Resolves a verified token to a user that still exists.
#[async_trait]
impl<R: UserRepository> IdentityResolver for UserService<R> {
    async fn resolve(&self, claims: &JwtClaims) -> Result<AuthUser, AppError> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

        match self.repository.get_by_id(id).await? {
            Some(user) => Ok(AuthUser {
                id: user.id,
                username: user.username,
                email: user.email,
            }),
            None => {
                warn!(user_id = %id, "Token subject no longer exists");
                Err(AppError::Unauthorized("User no longer exists".to_string()))
            }
        }
    }
}

fn validate_registration(input: &RegisterRequest) -> Result<(), Vec<FieldViolation>> {
    let mut violations = match input.validate() {
        Ok(()) => Vec::new(),
        Err(e) => FieldViolation::from_validation_errors(&e),
    };

    let username_ok = input
        .username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !username_ok {
        violations.push(FieldViolation::new(
            "username",
            "Username can only contain letters, numbers, underscores, and hyphens",
        ));
    }

    violations.extend(
        password_violations(&input.password)
            .into_iter()
            .map(|msg| FieldViolation::new("password", msg)),
    );

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Complexity rules beyond the length bound.
fn password_violations(password: &str) -> Vec<&'static str> {
    let mut problems = Vec::new();
    if !password.chars().any(|c| c.is_uppercase()) {
        problems.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        problems.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("Password must contain at least one digit");
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        problems.push("Password must contain at least one special character");
    }
    problems
}

/// Runs Argon2 work on the blocking pool so request workers stay free.
async fn off_runtime<T, F>(work: F) -> UserResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> UserResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| UserError::Internal(format!("Password task failed: {e}")))?
}

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use axum_helpers::JwtConfig;
    use mockall::predicate::eq;

    const SECRET: &str = "test-secret-that-is-at-least-32-chars!!";

    fn jwt() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(SECRET))
    }

    fn register_input() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            email: "Alice@Example.com".into(),
            password: "Sup3r$ecret".into(),
        }
    }

    fn fields(violations: &[FieldViolation]) -> Vec<&str> {
        let mut fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        fields.sort();
        fields.dedup();
        fields
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Sup3r$ecret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Sup3r$ecret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_password_work_runs_on_blocking_pool() {
        let hash = off_runtime(|| hash_password("Sup3r$ecret")).await.unwrap();
        let matches = off_runtime(move || verify_password("Sup3r$ecret", &hash))
            .await
            .unwrap();
        assert!(matches);

        let err = off_runtime(|| verify_password("x", "not-a-phc-string"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::PasswordHash(_)));
    }

    #[test]
    fn test_password_rules_are_all_reported() {
        assert_eq!(password_violations("password").len(), 3);
        assert!(password_violations("Sup3r$ecret").is_empty());
    }

    #[test]
    fn test_registration_violations_collected() {
        let violations = validate_registration(&RegisterRequest {
            username: "a b".into(),
            email: "not-an-email".into(),
            password: "short".into(),
        })
        .unwrap_err();

        assert_eq!(fields(&violations), ["email", "password", "username"]);
    }

    #[tokio::test]
    async fn test_register_normalizes_email_and_issues_token() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_email()
            .with(eq("alice@example.com"))
            .returning(|_| Ok(None));
        repo.expect_create()
            .withf(|user| {
                user.email == "alice@example.com" && user.password_hash.starts_with("$argon2id$")
            })
            .times(1)
            .returning(Ok);

        let service = UserService::new(repo, jwt());
        let data = service.register(register_input()).await.unwrap();

        assert_eq!(data.user.email, "alice@example.com");
        let claims = jwt().verify_token(&data.token).unwrap();
        assert_eq!(claims.sub, data.user.id.to_string());
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_email().returning(|email| {
            Ok(Some(User::new("bob".into(), email.to_string(), "hash".into())))
        });
        repo.expect_create().times(0);

        let service = UserService::new(repo, jwt());
        let err = service.register(register_input()).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email_look_the_same() {
        let stored = User::new(
            "alice".into(),
            "alice@example.com".into(),
            hash_password("Sup3r$ecret").unwrap(),
        );
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_email().returning(move |email| {
            Ok((email == "alice@example.com").then(|| stored.clone()))
        });

        let service = UserService::new(repo, jwt());

        let wrong_password = service
            .login(LoginRequest {
                email: "alice@example.com".into(),
                password: "Wr0ng$pass".into(),
            })
            .await
            .unwrap_err();
        let unknown = service
            .login(LoginRequest {
                email: "nobody@example.com".into(),
                password: "Sup3r$ecret".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, UserError::InvalidCredentials));
        assert!(matches!(unknown, UserError::InvalidCredentials));

        let ok = service
            .login(LoginRequest {
                email: " ALICE@example.com ".into(),
                password: "Sup3r$ecret".into(),
            })
            .await
            .unwrap();
        assert_eq!(ok.user.username, "alice");
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let repo = MockUserRepository::new();
        let service = UserService::new(repo, jwt());

        let err = service.login(LoginRequest::default()).await.unwrap_err();
        match err {
            UserError::Validation(v) => assert_eq!(fields(&v), ["email", "password"]),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolver_rejects_deleted_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));
        let service = UserService::new(repo, jwt());

        let token = jwt()
            .issue_token(&Uuid::now_v7().to_string(), "ghost", "ghost@example.com")
            .unwrap();
        let claims = jwt().verify_token(&token).unwrap();

        let err = service.resolve(&claims).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "User no longer exists"));
    }

    #[tokio::test]
    async fn test_resolver_returns_live_user() {
        let user = User::new("alice".into(), "alice@example.com".into(), "hash".into());
        let id = user.id;
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(user.clone())));
        let service = UserService::new(repo, jwt());

        let claims = jwt()
            .verify_token(&jwt().issue_token(&id.to_string(), "alice", "alice@example.com").unwrap())
            .unwrap();
        let resolved = service.resolve(&claims).await.unwrap();
        assert_eq!(resolved.id, id);
        assert_eq!(resolved.username, "alice");
    }
}
