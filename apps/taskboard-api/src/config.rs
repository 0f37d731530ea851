use core_config::{
    AppInfo, ConfigError, FromEnv, app_info, env_or_default, server::ServerConfig,
};
use axum_helpers::{CorsConfig, JwtConfig};
use database::mongodb::MongoConfig;
use std::fmt;
use std::str::FromStr;

pub use core_config::Environment;

/// Where tasks and users are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store '{other}', expected mongodb or memory")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MongoDb => "mongodb",
            Self::Memory => "memory",
        })
    }
}

/// Application configuration composed from the shared config pieces.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub jwt: JwtConfig,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        let store_raw = env_or_default("TASKBOARD_STORE", "mongodb");
        let store = store_raw
            .parse()
            .map_err(|details| ConfigError::ParseError {
                key: "TASKBOARD_STORE".to_string(),
                details,
            })?;

        Ok(Self {
            app: app_info!(),
            server: ServerConfig::from_env()?,
            cors: CorsConfig::from_env(&environment)?,
            jwt: JwtConfig::from_env()?,
            store,
            mongodb: MongoConfig::from_env()?,
            environment,
        })
    }
}
