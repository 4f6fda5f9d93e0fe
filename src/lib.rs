//! IDMC 2026 registration backend
//!
//! Registration, payment verification, invoicing, workshop seating and
//! attendee check-in for the IDMC 2026 conference. Persistence sits behind
//! async store traits with PostgreSQL and in-memory implementations; the
//! `idmc` binary exposes the admin operations on the command line.

pub mod cli;
pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{IdmcError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
