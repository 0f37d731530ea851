use axum::http::{HeaderValue, Method, header};
use core_config::{ConfigError, Environment};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Allowed browser origins.
///
/// `CORS_ALLOWED_ORIGIN` holds a comma-separated list. It is required in
/// production; in development an unset variable allows any origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorsConfig {
    Origins(Vec<String>),
    Permissive,
}

impl CorsConfig {
    pub fn from_env(environment: &Environment) -> Result<Self, ConfigError> {
        match std::env::var("CORS_ALLOWED_ORIGIN") {
            Ok(raw) => {
                let origins: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if origins.is_empty() {
                    return Err(ConfigError::ParseError {
                        key: "CORS_ALLOWED_ORIGIN".to_string(),
                        details: "cannot be empty".to_string(),
                    });
                }
                Ok(Self::Origins(origins))
            }
            Err(_) if environment.is_production() => {
                Err(ConfigError::MissingEnvVar("CORS_ALLOWED_ORIGIN".to_string()))
            }
            Err(_) => Ok(Self::Permissive),
        }
    }
}

pub fn create_cors_layer(config: &CorsConfig) -> Result<CorsLayer, ConfigError> {
    let origins = match config {
        CorsConfig::Permissive => return Ok(CorsLayer::permissive()),
        CorsConfig::Origins(origins) => origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: e.to_string(),
            })?,
    };

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}
