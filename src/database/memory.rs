//! In-memory store
//!
//! Backs every store trait with process-local maps. Used by tests and by the
//! CLI's dry runs; it honours the same conditional-write semantics as the
//! PostgreSQL repositories.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::database::store::*;
use crate::models::*;
use crate::utils::errors::{IdmcError, Result};

#[derive(Debug, Default)]
pub struct MemoryStore {
    registrations: RwLock<HashMap<String, Registration>>,
    sessions: RwLock<HashMap<String, Session>>,
    admins: RwLock<HashMap<String, AdminUser>>,
    activity: RwLock<Vec<ActivityLogEntry>>,
    inquiries: RwLock<HashMap<String, ContactInquiry>>,
    settings: RwLock<HashMap<String, SettingEntry>>,
    invoice_counters: RwLock<HashMap<i32, i64>>,
    content: RwLock<HashMap<String, ContentItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(registrations: &mut [Registration]) {
    registrations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn insert(&self, registration: &Registration) -> Result<()> {
        let mut registrations = self.registrations.write().await;
        if registrations.contains_key(&registration.id) {
            return Err(IdmcError::Validation(format!(
                "Registration {} already exists",
                registration.id
            )));
        }
        let email = &registration.primary_attendee.email;
        if registrations.values().any(|r| &r.primary_attendee.email == email) {
            return Err(IdmcError::DuplicateEmail { email: email.clone() });
        }
        registrations.insert(registration.id.clone(), registration.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Registration>> {
        Ok(self.registrations.read().await.get(id).cloned())
    }

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<Registration>> {
        Ok(self
            .registrations
            .read()
            .await
            .values()
            .find(|r| r.short_code == short_code)
            .cloned())
    }

    async fn find_by_suffix(&self, suffix: &str) -> Result<Vec<Registration>> {
        let mut found: Vec<Registration> = self
            .registrations
            .read()
            .await
            .values()
            .filter(|r| r.short_code_suffix == suffix)
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Registration>> {
        let mut found: Vec<Registration> = self
            .registrations
            .read()
            .await
            .values()
            .filter(|r| r.attendees().any(|a| a.email == email))
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn primary_email_exists(&self, email: &str) -> Result<bool> {
        Ok(self
            .registrations
            .read()
            .await
            .values()
            .any(|r| r.primary_attendee.email == email))
    }

    async fn short_code_exists(&self, short_code: &str) -> Result<bool> {
        Ok(self
            .registrations
            .read()
            .await
            .values()
            .any(|r| r.short_code == short_code))
    }

    async fn list(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        let mut found: Vec<Registration> = self
            .registrations
            .read()
            .await
            .values()
            .filter(|r| filter.status.map_or(true, |status| r.status == status))
            .cloned()
            .collect();
        newest_first(&mut found);
        if let Some(limit) = filter.limit {
            found.truncate(limit.max(0) as usize);
        }
        Ok(found)
    }

    async fn list_waitlisted(&self, session_id: &str) -> Result<Vec<Registration>> {
        let mut found: Vec<Registration> = self
            .registrations
            .read()
            .await
            .values()
            .filter(|r| {
                r.workshop_selections
                    .iter()
                    .any(|s| s.session_id == session_id && s.status == SeatStatus::Waitlisted)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn replace(&self, registration: &Registration) -> Result<bool> {
        let mut registrations = self.registrations.write().await;
        match registrations.get_mut(&registration.id) {
            Some(stored) if stored.version == registration.version => {
                let mut next = registration.clone();
                next.version += 1;
                *stored = next;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(IdmcError::RegistrationNotFound {
                registration_id: registration.id.clone(),
            }),
        }
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut registrations = self.registrations.write().await;
        let removed = registrations.len() as u64;
        registrations.clear();
        Ok(removed)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.registrations.read().await.len() as i64)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        self.sessions.write().await.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self.sessions.read().await.values().cloned().collect();
        sessions.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.title.cmp(&b.title)));
        Ok(sessions)
    }

    async fn update(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(IdmcError::WorkshopNotFound { session_id: session.id.clone() }),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn reserve_seat(&self, id: &str) -> Result<SeatReservation> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| IdmcError::WorkshopNotFound { session_id: id.to_string() })?;

        if session.is_full() {
            return Ok(SeatReservation::Full);
        }
        session.registered_count += 1;
        session.updated_at = Utc::now();
        Ok(SeatReservation::Reserved)
    }

    async fn release_seat(&self, id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| IdmcError::WorkshopNotFound { session_id: id.to_string() })?;
        session.registered_count = (session.registered_count - 1).max(0);
        session.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn insert(&self, admin: &AdminUser) -> Result<()> {
        let mut admins = self.admins.write().await;
        if admins.contains_key(&admin.email) {
            return Err(IdmcError::AdminAlreadyExists { email: admin.email.clone() });
        }
        admins.insert(admin.email.clone(), admin.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        Ok(self.admins.read().await.get(email).cloned())
    }

    async fn list(&self) -> Result<Vec<AdminUser>> {
        let mut admins: Vec<AdminUser> = self.admins.read().await.values().cloned().collect();
        admins.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(admins)
    }

    async fn update(&self, admin: &AdminUser) -> Result<()> {
        let mut admins = self.admins.write().await;
        match admins.get_mut(&admin.email) {
            Some(stored) => {
                *stored = admin.clone();
                Ok(())
            }
            None => Err(IdmcError::AdminNotFound { email: admin.email.clone() }),
        }
    }
}

#[async_trait]
impl ActivityLogStore for MemoryStore {
    async fn append(&self, entry: &ActivityLogEntry) -> Result<()> {
        self.activity.write().await.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        Ok(self
            .activity
            .read()
            .await
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InquiryStore for MemoryStore {
    async fn insert(&self, inquiry: &ContactInquiry) -> Result<()> {
        self.inquiries.write().await.insert(inquiry.id.clone(), inquiry.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ContactInquiry>> {
        Ok(self.inquiries.read().await.get(id).cloned())
    }

    async fn list(&self, status: Option<InquiryStatus>) -> Result<Vec<ContactInquiry>> {
        let mut inquiries: Vec<ContactInquiry> = self
            .inquiries
            .read()
            .await
            .values()
            .filter(|i| status.map_or(true, |s| i.status == s))
            .cloned()
            .collect();
        inquiries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(inquiries)
    }

    async fn update(&self, inquiry: &ContactInquiry) -> Result<()> {
        let mut inquiries = self.inquiries.write().await;
        match inquiries.get_mut(&inquiry.id) {
            Some(stored) => {
                *stored = inquiry.clone();
                Ok(())
            }
            None => Err(IdmcError::InquiryNotFound { inquiry_id: inquiry.id.clone() }),
        }
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<SettingEntry>> {
        Ok(self.settings.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: serde_json::Value, updated_by: Option<&str>) -> Result<SettingEntry> {
        let entry = SettingEntry {
            key: key.to_string(),
            value,
            updated_by: updated_by.map(str::to_string),
            updated_at: Utc::now(),
        };
        self.settings.write().await.insert(key.to_string(), entry.clone());
        Ok(entry)
    }

    async fn next_invoice_sequence(&self, year: i32) -> Result<i64> {
        let mut counters = self.invoice_counters.write().await;
        let counter = counters.entry(year).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list(&self, kind: ContentKind, published_only: bool) -> Result<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> = self
            .content
            .read()
            .await
            .values()
            .filter(|item| item.kind == kind && (!published_only || item.published))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.title.cmp(&b.title)));
        Ok(items)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ContentItem>> {
        Ok(self.content.read().await.get(id).cloned())
    }

    async fn upsert(&self, item: &ContentItem) -> Result<()> {
        self.content.write().await.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.content.write().await.remove(id).is_some())
    }

    async fn set_sort_order(&self, id: &str, sort_order: i32, updated_at: DateTime<Utc>) -> Result<bool> {
        let mut content = self.content.write().await;
        match content.get_mut(id) {
            Some(item) => {
                item.sort_order = sort_order;
                item.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
