//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the registration backend.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{IdmcError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for as long as the process logs.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "idmc.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| IdmcError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log admin actions
pub fn log_admin_action(admin: &str, action: &str, target: Option<&str>, details: Option<&str>) {
    info!(
        admin = admin,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log check-in transitions
pub fn log_check_in(registration_id: &str, attendee_index: Option<usize>, checked_in: bool, by: &str) {
    info!(
        registration_id = registration_id,
        attendee_index = attendee_index,
        checked_in = checked_in,
        by = by,
        "Check-in state changed"
    );
}

/// Log registration lifecycle events
pub fn log_registration_event(registration_id: &str, event: &str, details: Option<&str>) {
    info!(
        registration_id = registration_id,
        event = event,
        details = details,
        "Registration event"
    );
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        warn!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}
