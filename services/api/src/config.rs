//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_SCORING_BACKEND_URL: &str = "http://localhost:8000";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub scoring_backend_url: String,
    pub scoring_timeout: Duration,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Scoring Backend ---
        let scoring_backend_url = lookup("SCORING_BACKEND_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SCORING_BACKEND_URL.to_string());
        let is_http = scoring_backend_url.starts_with("http://")
            || scoring_backend_url.starts_with("https://");
        if !is_http {
            return Err(ConfigError::InvalidValue(
                "SCORING_BACKEND_URL".to_string(),
                format!("'{}' is not an http(s) URL", scoring_backend_url),
            ));
        }

        let timeout_str = lookup("SCORING_TIMEOUT_SECS").unwrap_or_else(|| "5".to_string());
        let scoring_timeout = match timeout_str.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                return Err(ConfigError::InvalidValue(
                    "SCORING_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                ))
            }
        };

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            scoring_backend_url,
            scoring_timeout,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_is_set() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/virality")]).unwrap();
        assert_eq!(config.scoring_backend_url, DEFAULT_SCORING_BACKEND_URL);
        assert_eq!(config.scoring_timeout, Duration::from_secs(5));
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn scoring_url_trailing_slash_is_dropped() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("SCORING_BACKEND_URL", "http://ml:8000/"),
        ])
        .unwrap();
        assert_eq!(config.scoring_backend_url, "http://ml:8000");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(load(&[("DATABASE_URL", "x"), ("SCORING_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("SCORING_BACKEND_URL", "ml:8000")]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("BIND_ADDRESS", "nowhere")]).is_err());
    }
}
