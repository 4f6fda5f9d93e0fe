//! Database repositories module
//!
//! This module contains the PostgreSQL implementations of the store traits

pub mod registration;
pub mod session;
pub mod admin;
pub mod activity;
pub mod inquiry;
pub mod settings;
pub mod content;

// Re-export repositories
pub use registration::RegistrationRepository;
pub use session::SessionRepository;
pub use admin::AdminRepository;
pub use activity::ActivityLogRepository;
pub use inquiry::InquiryRepository;
pub use settings::SettingsRepository;
pub use content::ContentRepository;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::utils::errors::{IdmcError, Result};

/// Store a snake_case serde enum as TEXT
pub(crate) fn enum_to_text<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(text) => Ok(text),
        other => Err(IdmcError::Validation(format!("Expected a unit enum, got {}", other))),
    }
}

/// Read a snake_case serde enum back from TEXT
pub(crate) fn enum_from_text<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::String(text.to_string()))?)
}
