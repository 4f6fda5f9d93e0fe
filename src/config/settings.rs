//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `IDMC__DATABASE__URL`
pub const ENV_PREFIX: &str = "IDMC";

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub functions: FunctionsConfig,
    pub event: EventConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Remote callable functions configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionsConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
}

/// Conference-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventConfig {
    pub year: i32,
    pub payment_deadline_days: i64,
    pub search_scan_limit: i64,
    pub short_code_attempts: u32,
    pub check_in_retries: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub stats_cache: bool,
    pub workshop_waitlist: bool,
}

impl Settings {
    /// Load settings from `config.toml` (optional) and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load(config::File::with_name("config").required(false))
    }

    /// Load settings from an explicit file plus environment variables
    pub fn from_file(path: &Path) -> Result<Self, config::ConfigError> {
        Self::load(config::File::from(path).required(true))
    }

    fn load<S>(file: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::IdmcError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/idmc".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "idmc:".to_string(),
                ttl_seconds: 300,
            },
            functions: FunctionsConfig {
                base_url: "http://localhost:5001/idmc-2026/us-central1".to_string(),
                timeout_seconds: 10,
                api_key: None,
            },
            event: EventConfig {
                year: 2026,
                payment_deadline_days: 7,
                search_scan_limit: 500,
                short_code_attempts: 5,
                check_in_retries: 3,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
            },
            features: FeaturesConfig {
                stats_cache: false,
                workshop_waitlist: true,
            },
        }
    }
}
