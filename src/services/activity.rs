//! Activity log service
//!
//! Writes the admin audit trail. A failed write is logged and dropped; it
//! never fails the action being audited.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::database::store::ActivityLogStore;
use crate::models::activity::{ActivityLogEntry, NewActivityLogEntry};
use crate::utils::errors::Result;
use crate::utils::helpers::generate_uuid;
use crate::utils::logging::log_admin_action;

#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn ActivityLogStore>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn ActivityLogStore>) -> Self {
        Self { store }
    }

    /// Append an entry to the audit trail
    pub async fn log(&self, entry: NewActivityLogEntry) {
        log_admin_action(&entry.admin, &entry.action, entry.target_id.as_deref(), None);

        let record = ActivityLogEntry {
            id: generate_uuid(),
            admin: entry.admin,
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id,
            details: entry.details,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.append(&record).await {
            warn!(action = %record.action, error = %e, "Failed to write activity log entry");
        }
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        self.store.recent(limit.clamp(1, 500)).await
    }
}
