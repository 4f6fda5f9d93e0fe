//! Settings and invoice counter repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::database::store::SettingsStore;
use crate::models::settings::SettingEntry;
use crate::utils::errors::Result;

#[derive(Clone, Debug)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<SettingEntry>> {
        let row: Option<(String, serde_json::Value, Option<String>, chrono::DateTime<Utc>)> = sqlx::query_as(
            "SELECT key, value, updated_by, updated_at FROM settings WHERE key = $1"
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(key, value, updated_by, updated_at)| SettingEntry {
            key,
            value,
            updated_by,
            updated_at,
        }))
    }

    async fn put(&self, key: &str, value: serde_json::Value, updated_by: Option<&str>) -> Result<SettingEntry> {
        let updated_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_by, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key)
            DO UPDATE SET
                value = EXCLUDED.value,
                updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(key)
        .bind(&value)
        .bind(updated_by)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(SettingEntry {
            key: key.to_string(),
            value,
            updated_by: updated_by.map(str::to_string),
            updated_at,
        })
    }

    async fn next_invoice_sequence(&self, year: i32) -> Result<i64> {
        // Single statement, so concurrent callers serialize on the row lock
        let next: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO invoice_counters (year, last_value)
            VALUES ($1, 1)
            ON CONFLICT (year)
            DO UPDATE SET last_value = invoice_counters.last_value + 1
            RETURNING last_value
            "#
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        Ok(next.0)
    }
}
