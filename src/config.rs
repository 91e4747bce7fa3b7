use std::env;

use crate::error::{ApiError, Result};
use crate::token::SigningAlgorithm;

/// Process configuration, read once at startup and handed to the services
/// that need it. Request-scoped code never consults the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub algorithm: SigningAlgorithm,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("SERVER_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:expenses.db".to_string());

        Ok(Self {
            host,
            port,
            database_url,
            auth: AuthConfig::from_env()?,
        })
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("SECRET_KEY")
            .map_err(|_| ApiError::Config("SECRET_KEY must be set".to_string()))?;

        let algorithm = env::var("ALGORITHM")
            .map_err(|_| ApiError::Config("ALGORITHM must be set".to_string()))?
            .parse::<SigningAlgorithm>()
            .map_err(|err| ApiError::Config(err.to_string()))?;

        Ok(Self { secret, algorithm })
    }
}
