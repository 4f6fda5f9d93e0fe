//! Error handling for the registration backend
//!
//! This module defines the main error type used throughout the application.
//! Domain errors carry a stable string code which callers render as
//! user-facing messages.

use thiserror::Error;

/// Main error type for the registration backend
#[derive(Error, Debug)]
pub enum IdmcError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Callable function error: {0}")]
    Functions(#[from] FunctionsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A registration with email {email} already exists")]
    DuplicateEmail { email: String },

    #[error("Registration not found: {registration_id}")]
    RegistrationNotFound { registration_id: String },

    #[error("Registration {registration_id} is not confirmed (status: {status})")]
    RegistrationNotConfirmed { registration_id: String, status: String },

    #[error("Attendee index {index} is out of range (registration has {total} attendees)")]
    InvalidAttendeeIndex { index: usize, total: usize },

    #[error("Attendee {index} is already checked in")]
    AttendeeAlreadyCheckedIn { index: usize },

    #[error("Attendee {index} is not checked in")]
    AttendeeNotCheckedIn { index: usize },

    #[error("All attendees of {registration_id} are already checked in")]
    AlreadyCheckedIn { registration_id: String },

    #[error("Invalid QR code")]
    InvalidQrCode,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Workshop not found: {session_id}")]
    WorkshopNotFound { session_id: String },

    #[error("Workshop is full: {session_id}")]
    WorkshopFull { session_id: String },

    #[error("Registration {registration_id} was modified concurrently")]
    ConcurrentModification { registration_id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Admin not found: {email}")]
    AdminNotFound { email: String },

    #[error("Admin already exists: {email}")]
    AdminAlreadyExists { email: String },

    #[error("Inquiry not found: {inquiry_id}")]
    InquiryNotFound { inquiry_id: String },

    #[error("Could not allocate a unique short code")]
    ShortCodeExhausted,
}

/// Errors returned by the remote callable functions endpoint
#[derive(Error, Debug)]
pub enum FunctionsError {
    #[error("Function {name} returned status {status}: {body}")]
    RequestFailed { name: String, status: u16, body: String },

    #[error("Function {name} returned an unexpected payload: {reason}")]
    InvalidResponse { name: String, reason: String },
}

impl From<config::ConfigError> for IdmcError {
    fn from(err: config::ConfigError) -> Self {
        IdmcError::Config(err.to_string())
    }
}

/// Result type alias for registration backend operations
pub type Result<T> = std::result::Result<T, IdmcError>;

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

impl IdmcError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            IdmcError::DuplicateEmail { .. } => "DUPLICATE_EMAIL",
            IdmcError::RegistrationNotFound { .. } => "REGISTRATION_NOT_FOUND",
            IdmcError::RegistrationNotConfirmed { .. } => "REGISTRATION_NOT_CONFIRMED",
            IdmcError::InvalidAttendeeIndex { .. } => "INVALID_ATTENDEE_INDEX",
            IdmcError::AttendeeAlreadyCheckedIn { .. } => "ATTENDEE_ALREADY_CHECKED_IN",
            IdmcError::AttendeeNotCheckedIn { .. } => "ATTENDEE_NOT_CHECKED_IN",
            IdmcError::AlreadyCheckedIn { .. } => "ALREADY_CHECKED_IN",
            IdmcError::InvalidQrCode => "INVALID_QR_CODE",
            IdmcError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            IdmcError::WorkshopNotFound { .. } => "WORKSHOP_NOT_FOUND",
            IdmcError::WorkshopFull { .. } => "WORKSHOP_FULL",
            IdmcError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            IdmcError::Validation(_) => "VALIDATION_ERROR",
            IdmcError::PermissionDenied(_) => "PERMISSION_DENIED",
            IdmcError::AdminNotFound { .. } => "ADMIN_NOT_FOUND",
            IdmcError::AdminAlreadyExists { .. } => "ADMIN_ALREADY_EXISTS",
            IdmcError::InquiryNotFound { .. } => "INQUIRY_NOT_FOUND",
            IdmcError::ShortCodeExhausted => "SHORT_CODE_EXHAUSTED",
            IdmcError::Config(_) => "CONFIG_ERROR",
            IdmcError::Database(_)
            | IdmcError::Migration(_)
            | IdmcError::Redis(_)
            | IdmcError::Http(_)
            | IdmcError::Functions(_)
            | IdmcError::Serialization(_)
            | IdmcError::Io(_)
            | IdmcError::UrlParse(_) => "INTERNAL",
        }
    }

    /// Message suitable for showing to an attendee or admin.
    ///
    /// Platform and network failures never leak their details.
    pub fn user_message(&self) -> String {
        match self.code() {
            "INTERNAL" | "CONFIG_ERROR" => GENERIC_MESSAGE.to_string(),
            "DUPLICATE_EMAIL" => {
                "This email is already registered. Please use a different email or contact us.".to_string()
            }
            "REGISTRATION_NOT_FOUND" => "Registration not found.".to_string(),
            "REGISTRATION_NOT_CONFIRMED" => {
                "This registration is not yet confirmed and cannot be checked in.".to_string()
            }
            "INVALID_QR_CODE" => "Invalid QR code format.".to_string(),
            _ => self.to_string(),
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IdmcError::Redis(_)
                | IdmcError::Http(_)
                | IdmcError::Functions(_)
                | IdmcError::Io(_)
                | IdmcError::ConcurrentModification { .. }
                | IdmcError::ShortCodeExhausted
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            IdmcError::Database(_) => ErrorSeverity::Critical,
            IdmcError::Migration(_) => ErrorSeverity::Critical,
            IdmcError::Config(_) => ErrorSeverity::Critical,
            IdmcError::PermissionDenied(_) => ErrorSeverity::Warning,
            IdmcError::ConcurrentModification { .. } => ErrorSeverity::Warning,
            IdmcError::Validation(_)
            | IdmcError::DuplicateEmail { .. }
            | IdmcError::InvalidQrCode
            | IdmcError::AttendeeAlreadyCheckedIn { .. }
            | IdmcError::AttendeeNotCheckedIn { .. }
            | IdmcError::AlreadyCheckedIn { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_codes() {
        let err = IdmcError::DuplicateEmail { email: "a@b.com".to_string() };
        assert_eq!(err.code(), "DUPLICATE_EMAIL");
        assert_eq!(IdmcError::AttendeeAlreadyCheckedIn { index: 1 }.code(), "ATTENDEE_ALREADY_CHECKED_IN");
        assert_eq!(IdmcError::InvalidQrCode.code(), "INVALID_QR_CODE");
    }

    #[test]
    fn test_infrastructure_errors_are_generic_for_users() {
        let err = IdmcError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"));
        assert_eq!(err.code(), "INTERNAL");
        assert_eq!(err.user_message(), GENERIC_MESSAGE);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_severity() {
        assert_eq!(IdmcError::Config("x".into()).severity(), ErrorSeverity::Critical);
        assert_eq!(IdmcError::InvalidQrCode.severity(), ErrorSeverity::Info);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }
}
