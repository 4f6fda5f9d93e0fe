//! Activity log repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::database::store::ActivityLogStore;
use crate::models::activity::ActivityLogEntry;
use crate::utils::errors::Result;

#[derive(FromRow)]
struct ActivityRow {
    id: String,
    admin: String,
    action: String,
    target_type: String,
    target_id: Option<String>,
    details: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityLogEntry {
    fn from(row: ActivityRow) -> Self {
        ActivityLogEntry {
            id: row.id,
            admin: row.admin,
            action: row.action,
            target_type: row.target_type,
            target_id: row.target_id,
            details: row.details,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ActivityLogRepository {
    pool: PgPool,
}

impl ActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogStore for ActivityLogRepository {
    async fn append(&self, entry: &ActivityLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, admin, action, target_type, target_id, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#
        )
        .bind(&entry.id)
        .bind(&entry.admin)
        .bind(&entry.action)
        .bind(&entry.target_type)
        .bind(&entry.target_id)
        .bind(&entry.details)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT id, admin, action, target_type, target_id, details, created_at FROM activity_logs ORDER BY created_at DESC LIMIT $1"
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ActivityLogEntry::from).collect())
    }
}
