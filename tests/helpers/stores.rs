//! Store wrappers that inject latency or failures into an in-memory store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use idmc_registration::database::{MemoryStore, RegistrationStore, SettingsStore};
use idmc_registration::models::{Registration, RegistrationFilter, SettingEntry};
use idmc_registration::{IdmcError, Result};

/// Registration store whose conditional writes stall before landing, so two
/// writers read the same version and race on `replace`
pub struct SlowReplaceStore {
    inner: Arc<MemoryStore>,
    delay: Duration,
}

impl SlowReplaceStore {
    pub fn new(inner: Arc<MemoryStore>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl RegistrationStore for SlowReplaceStore {
    async fn insert(&self, registration: &Registration) -> Result<()> {
        RegistrationStore::insert(self.inner.as_ref(), registration).await
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Registration>> {
        RegistrationStore::find_by_id(self.inner.as_ref(), id).await
    }
    async fn find_by_short_code(&self, code: &str) -> Result<Option<Registration>> {
        RegistrationStore::find_by_short_code(self.inner.as_ref(), code).await
    }
    async fn find_by_suffix(&self, suffix: &str) -> Result<Vec<Registration>> {
        RegistrationStore::find_by_suffix(self.inner.as_ref(), suffix).await
    }
    async fn find_by_email(&self, email: &str) -> Result<Vec<Registration>> {
        RegistrationStore::find_by_email(self.inner.as_ref(), email).await
    }
    async fn primary_email_exists(&self, email: &str) -> Result<bool> {
        RegistrationStore::primary_email_exists(self.inner.as_ref(), email).await
    }
    async fn short_code_exists(&self, code: &str) -> Result<bool> {
        RegistrationStore::short_code_exists(self.inner.as_ref(), code).await
    }
    async fn list(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        RegistrationStore::list(self.inner.as_ref(), filter).await
    }
    async fn list_waitlisted(&self, session_id: &str) -> Result<Vec<Registration>> {
        RegistrationStore::list_waitlisted(self.inner.as_ref(), session_id).await
    }
    async fn replace(&self, registration: &Registration) -> Result<bool> {
        tokio::time::sleep(self.delay).await;
        RegistrationStore::replace(self.inner.as_ref(), registration).await
    }
    async fn delete_all(&self) -> Result<u64> {
        RegistrationStore::delete_all(self.inner.as_ref()).await
    }
    async fn count(&self) -> Result<i64> {
        RegistrationStore::count(self.inner.as_ref()).await
    }
}

/// Settings store whose invoice counter can be switched off
pub struct FlakyInvoiceCounter {
    inner: Arc<MemoryStore>,
    failing: AtomicBool,
}

impl FlakyInvoiceCounter {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self { inner, failing: AtomicBool::new(false) }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsStore for FlakyInvoiceCounter {
    async fn get(&self, key: &str) -> Result<Option<SettingEntry>> {
        SettingsStore::get(self.inner.as_ref(), key).await
    }
    async fn put(&self, key: &str, value: serde_json::Value, updated_by: Option<&str>) -> Result<SettingEntry> {
        SettingsStore::put(self.inner.as_ref(), key, value, updated_by).await
    }
    async fn next_invoice_sequence(&self, year: i32) -> Result<i64> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IdmcError::Database(sqlx::Error::PoolTimedOut));
        }
        SettingsStore::next_invoice_sequence(self.inner.as_ref(), year).await
    }
}
