//! Store interfaces
//!
//! Services depend on these traits rather than on a concrete backend. The
//! PostgreSQL repositories and the in-memory store both implement all of them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::*;
use crate::utils::errors::{IdmcError, Result};
use crate::utils::logging::log_database_operation;

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Insert a new registration. Fails if the id already exists.
    async fn insert(&self, registration: &Registration) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Registration>>;

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<Registration>>;

    async fn find_by_suffix(&self, suffix: &str) -> Result<Vec<Registration>>;

    /// Registrations where any attendee uses `email` (already normalized)
    async fn find_by_email(&self, email: &str) -> Result<Vec<Registration>>;

    /// Whether a primary attendee already registered with `email`
    async fn primary_email_exists(&self, email: &str) -> Result<bool>;

    async fn short_code_exists(&self, short_code: &str) -> Result<bool>;

    /// Newest first
    async fn list(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>>;

    /// Registrations holding a waitlisted seat for `session_id`, oldest first
    async fn list_waitlisted(&self, session_id: &str) -> Result<Vec<Registration>>;

    /// Conditional write. Replaces the stored document only if its version is
    /// still `registration.version`, then bumps the version. Returns `false`
    /// when another writer got there first.
    async fn replace(&self, registration: &Registration) -> Result<bool>;

    async fn delete_all(&self) -> Result<u64>;

    async fn count(&self) -> Result<i64>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>>;

    async fn list(&self) -> Result<Vec<Session>>;

    async fn update(&self, session: &Session) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<bool>;

    /// Atomically take one seat unless the workshop is at capacity
    async fn reserve_seat(&self, id: &str) -> Result<SeatReservation>;

    /// Atomically give back one seat, never going below zero
    async fn release_seat(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn insert(&self, admin: &AdminUser) -> Result<()>;

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>>;

    async fn list(&self) -> Result<Vec<AdminUser>>;

    async fn update(&self, admin: &AdminUser) -> Result<()>;
}

#[async_trait]
pub trait ActivityLogStore: Send + Sync {
    async fn append(&self, entry: &ActivityLogEntry) -> Result<()>;

    /// Newest first
    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>>;
}

#[async_trait]
pub trait InquiryStore: Send + Sync {
    async fn insert(&self, inquiry: &ContactInquiry) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ContactInquiry>>;

    /// Newest first
    async fn list(&self, status: Option<InquiryStatus>) -> Result<Vec<ContactInquiry>>;

    async fn update(&self, inquiry: &ContactInquiry) -> Result<()>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<SettingEntry>>;

    async fn put(&self, key: &str, value: serde_json::Value, updated_by: Option<&str>) -> Result<SettingEntry>;

    /// Atomically increment and return the invoice counter for `year`
    async fn next_invoice_sequence(&self, year: i32) -> Result<i64>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Ordered by `sort_order`, then title
    async fn list(&self, kind: ContentKind, published_only: bool) -> Result<Vec<ContentItem>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ContentItem>>;

    async fn upsert(&self, item: &ContentItem) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<bool>;

    async fn set_sort_order(&self, id: &str, sort_order: i32, updated_at: DateTime<Utc>) -> Result<bool>;
}

/// Read a registration, apply `apply` and write it back conditionally on its
/// version, re-reading after a conflict. Gives up with
/// `ConcurrentModification` after `max_attempts` lost races.
pub async fn update_registration<F>(
    store: &dyn RegistrationStore,
    registration_id: &str,
    max_attempts: u32,
    apply: F,
) -> Result<Registration>
where
    F: Fn(&mut Registration, DateTime<Utc>) -> Result<()> + Send + Sync,
{
    let started = std::time::Instant::now();
    for attempt in 1..=max_attempts.max(1) {
        let mut registration = store
            .find_by_id(registration_id)
            .await?
            .ok_or_else(|| IdmcError::RegistrationNotFound {
                registration_id: registration_id.to_string(),
            })?;

        let now = Utc::now();
        apply(&mut registration, now)?;
        registration.updated_at = now;

        if store.replace(&registration).await? {
            registration.version += 1;
            log_database_operation("update", "registrations", started.elapsed().as_millis() as u64, true);
            return Ok(registration);
        }

        debug!(registration_id = registration_id, attempt = attempt, "Registration write lost a race, retrying");
    }

    log_database_operation("update", "registrations", started.elapsed().as_millis() as u64, false);
    warn!(registration_id = registration_id, "Giving up registration write after repeated conflicts");
    Err(IdmcError::ConcurrentModification {
        registration_id: registration_id.to_string(),
    })
}
