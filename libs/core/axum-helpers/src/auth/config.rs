use super::jwt::DEFAULT_TOKEN_TTL_SECS;
use core_config::{ConfigError, FromEnv, env_parse_or_default, env_required};

const MIN_SECRET_LEN: usize = 32;

/// Token signing configuration.
///
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `JWT_EXPIRES_IN_SECS` (default 7 days)
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_secs: i64,
}

impl JwtConfig {
    /// # Panics
    /// Panics if the secret is shorter than 32 characters.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(
            secret.len() >= MIN_SECRET_LEN,
            "JWT secret must be at least 32 characters"
        );
        Self {
            secret,
            expires_in_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    pub fn with_expiry(mut self, secs: i64) -> Self {
        self.expires_in_secs = secs;
        self
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::ParseError {
                key: "JWT_SECRET".to_string(),
                details: format!(
                    "must be at least {MIN_SECRET_LEN} characters (got {}). Generate one with: openssl rand -base64 32",
                    secret.len()
                ),
            });
        }

        let expires_in_secs = env_parse_or_default("JWT_EXPIRES_IN_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        if expires_in_secs <= 0 {
            return Err(ConfigError::ParseError {
                key: "JWT_EXPIRES_IN_SECS".to_string(),
                details: "must be positive".to_string(),
            });
        }

        Ok(Self {
            secret,
            expires_in_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "this-is-a-valid-secret-with-32-chars!";

    #[test]
    fn test_jwt_config_new_valid() {
        let config = JwtConfig::new(SECRET);
        assert_eq!(config.secret, SECRET);
        assert_eq!(config.expires_in_secs, DEFAULT_TOKEN_TTL_SECS);
    }

    #[test]
    #[should_panic(expected = "JWT secret must be at least 32 characters")]
    fn test_jwt_config_new_too_short() {
        JwtConfig::new("short");
    }

    #[test]
    fn test_jwt_config_from_env() {
        temp_env::with_vars(
            [("JWT_SECRET", Some(SECRET)), ("JWT_EXPIRES_IN_SECS", Some("3600"))],
            || {
                let config = JwtConfig::from_env().unwrap();
                assert_eq!(config.secret, SECRET);
                assert_eq!(config.expires_in_secs, 3600);
            },
        );
    }

    #[test]
    fn test_jwt_config_from_env_missing_secret() {
        temp_env::with_var_unset("JWT_SECRET", || {
            let err = JwtConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("JWT_SECRET"));
        });
    }

    #[test]
    fn test_jwt_config_from_env_short_secret() {
        temp_env::with_var("JWT_SECRET", Some("too-short"), || {
            let err = JwtConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("at least 32"));
        });
    }

    #[test]
    fn test_jwt_config_from_env_rejects_non_positive_expiry() {
        temp_env::with_vars(
            [("JWT_SECRET", Some(SECRET)), ("JWT_EXPIRES_IN_SECS", Some("0"))],
            || {
                assert!(JwtConfig::from_env().is_err());
            },
        );
    }
}
