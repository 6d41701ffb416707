//! Configuration for the license server.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `config.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `HWBIND_SERVER_HOST` - Server bind address
//! - `HWBIND_SERVER_PORT` - Server port (falls back to `PORT`)
//! - `HWBIND_DATABASE_TYPE` - `sqlite` or `postgres`
//! - `HWBIND_DATABASE_URL` - Database connection URL
//! - `HWBIND_DATABASE_MAX_CONNECTIONS` - Pool size
//! - `HWBIND_LOGGING_ENABLED` - Enable logging output
//! - `HWBIND_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use config::Config;
use serde::Deserialize;
use std::env;

use crate::errors::{LicenseError, LicenseResult};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database type: "sqlite" or "postgres"
    pub db_type: String,
    /// Connection URL for the selected backend
    pub url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: "sqlite".to_string(),
            url: "sqlite://licenses.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl AppConfig {
    /// Load configuration from defaults, `config.toml` and the environment,
    /// then validate it.
    pub fn load() -> LicenseResult<Self> {
        let defaults = AppConfig::default();

        let port = env_parsed::<i64>("HWBIND_SERVER_PORT").or_else(|| env_parsed::<i64>("PORT"));

        let settings = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("database.db_type", defaults.database.db_type)?
            .set_default("database.url", defaults.database.url)?
            .set_default(
                "database.max_connections",
                i64::from(defaults.database.max_connections),
            )?
            .set_default("logging.enabled", defaults.logging.enabled)?
            .set_default("logging.level", defaults.logging.level)?
            // Load from config.toml (optional)
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables
            .set_override_option("server.host", env::var("HWBIND_SERVER_HOST").ok())?
            .set_override_option("server.port", port)?
            .set_override_option("database.db_type", env::var("HWBIND_DATABASE_TYPE").ok())?
            .set_override_option("database.url", env::var("HWBIND_DATABASE_URL").ok())?
            .set_override_option(
                "database.max_connections",
                env_parsed::<i64>("HWBIND_DATABASE_MAX_CONNECTIONS"),
            )?
            .set_override_option(
                "logging.enabled",
                env_parsed::<bool>("HWBIND_LOGGING_ENABLED"),
            )?
            .set_override_option("logging.level", env::var("HWBIND_LOG_LEVEL").ok())?
            .build()
            .map_err(|e| LicenseError::Config(format!("failed to build config: {e}")))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| LicenseError::Config(format!("failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.server.port == 0 {
            return Err(LicenseError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        let scheme = match self.database.db_type.as_str() {
            "sqlite" => "sqlite:",
            "postgres" => "postgres",
            other => {
                return Err(LicenseError::Config(format!(
                    "database.db_type must be 'sqlite' or 'postgres', got '{other}'"
                )));
            }
        };

        if !self.database.url.starts_with(scheme) {
            return Err(LicenseError::Config(format!(
                "database.url does not look like a {} URL",
                self.database.db_type
            )));
        }

        if self.database.max_connections == 0 {
            return Err(LicenseError::Config(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(LicenseError::Config(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }

    /// Address the HTTP listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
