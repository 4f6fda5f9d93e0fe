//! Database module
//!
//! This module handles database connections, the store interfaces and their
//! PostgreSQL and in-memory implementations

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations};
pub use memory::MemoryStore;
pub use service::DatabaseService;
pub use store::{
    RegistrationStore, SessionStore, AdminStore, ActivityLogStore, InquiryStore, SettingsStore, ContentStore,
};
