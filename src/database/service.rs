//! Database service layer
//!
//! Bundles one handle per store so services receive their persistence
//! explicitly instead of reaching for a global client.

use std::sync::Arc;

use crate::database::memory::MemoryStore;
use crate::database::repositories::*;
use crate::database::store::*;
use crate::database::DatabasePool;

#[derive(Clone)]
pub struct DatabaseService {
    pub registrations: Arc<dyn RegistrationStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub admins: Arc<dyn AdminStore>,
    pub activity: Arc<dyn ActivityLogStore>,
    pub inquiries: Arc<dyn InquiryStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub content: Arc<dyn ContentStore>,
}

impl DatabaseService {
    /// PostgreSQL-backed stores sharing one pool
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            registrations: Arc::new(RegistrationRepository::new(pool.clone())),
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            admins: Arc::new(AdminRepository::new(pool.clone())),
            activity: Arc::new(ActivityLogRepository::new(pool.clone())),
            inquiries: Arc::new(InquiryRepository::new(pool.clone())),
            settings: Arc::new(SettingsRepository::new(pool.clone())),
            content: Arc::new(ContentRepository::new(pool)),
        }
    }

    /// Process-local stores sharing one [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            registrations: store.clone(),
            sessions: store.clone(),
            admins: store.clone(),
            activity: store.clone(),
            inquiries: store.clone(),
            settings: store.clone(),
            content: store,
        }
    }
}

impl std::fmt::Debug for DatabaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseService").finish_non_exhaustive()
    }
}
