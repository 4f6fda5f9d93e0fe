//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{IdmcError, Result};
use super::Settings;

/// Bounds of the fallback substring scan used by registration search
pub const SEARCH_SCAN_BOUNDS: std::ops::RangeInclusive<i64> = 200..=500;

/// Allowed payment deadline, in days after registration
pub const PAYMENT_DEADLINE_DAYS: std::ops::RangeInclusive<i64> = 1..=365;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_functions_config(&settings.functions)?;
    validate_event_config(&settings.event)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(IdmcError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(IdmcError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(IdmcError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(IdmcError::Config(
            "Redis URL is required".to_string()
        ));
    }

    Ok(())
}

/// Validate callable functions configuration
fn validate_functions_config(config: &super::FunctionsConfig) -> Result<()> {
    url::Url::parse(&config.base_url)
        .map_err(|e| IdmcError::Config(format!("Invalid functions base URL: {}", e)))?;

    if config.timeout_seconds == 0 {
        return Err(IdmcError::Config(
            "Functions timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate conference configuration
fn validate_event_config(config: &super::EventConfig) -> Result<()> {
    if !(2000..=2100).contains(&config.year) {
        return Err(IdmcError::Config(
            format!("Conference year out of range: {}", config.year)
        ));
    }

    if !PAYMENT_DEADLINE_DAYS.contains(&config.payment_deadline_days) {
        return Err(IdmcError::Config(
            format!(
                "Payment deadline days must be between {} and {}",
                PAYMENT_DEADLINE_DAYS.start(),
                PAYMENT_DEADLINE_DAYS.end()
            )
        ));
    }

    if !SEARCH_SCAN_BOUNDS.contains(&config.search_scan_limit) {
        return Err(IdmcError::Config(
            format!(
                "Search scan limit must be between {} and {}",
                SEARCH_SCAN_BOUNDS.start(),
                SEARCH_SCAN_BOUNDS.end()
            )
        ));
    }

    if config.short_code_attempts == 0 || config.check_in_retries == 0 {
        return Err(IdmcError::Config(
            "Retry counts must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(IdmcError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(IdmcError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_rejects_scan_limit_out_of_bounds() {
        let mut settings = Settings::default();
        settings.event.search_scan_limit = 1000;
        assert_matches!(validate_settings(&settings), Err(IdmcError::Config(_)));

        settings.event.search_scan_limit = 200;
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_rejects_payment_deadline_out_of_bounds() {
        let mut settings = Settings::default();
        settings.event.payment_deadline_days = 366;
        assert_matches!(validate_settings(&settings), Err(IdmcError::Config(_)));

        settings.event.payment_deadline_days = 0;
        assert_matches!(validate_settings(&settings), Err(IdmcError::Config(_)));

        settings.event.payment_deadline_days = 365;
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_rejects_bad_pool_sizes() {
        let mut settings = Settings::default();
        settings.database.min_connections = 20;
        assert_matches!(validate_settings(&settings), Err(IdmcError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "loud".to_string();
        assert_matches!(validate_settings(&settings), Err(IdmcError::Config(_)));
    }
}
