//! Content repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::database::store::ContentStore;
use crate::models::content::{ContentItem, ContentKind};
use crate::utils::errors::{IdmcError, Result};

#[derive(FromRow)]
struct ContentRow {
    id: String,
    kind: String,
    title: String,
    data: serde_json::Value,
    sort_order: i32,
    published: bool,
    updated_by: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContentRow> for ContentItem {
    type Error = IdmcError;

    fn try_from(row: ContentRow) -> Result<Self> {
        let kind = ContentKind::parse(&row.kind)
            .ok_or_else(|| IdmcError::Validation(format!("Unknown content kind: {}", row.kind)))?;

        Ok(ContentItem {
            id: row.id,
            kind,
            title: row.title,
            data: row.data,
            sort_order: row.sort_order,
            published: row.published,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for ContentRepository {
    async fn list(&self, kind: ContentKind, published_only: bool) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, kind, title, data, sort_order, published, updated_by, updated_at
            FROM content_items
            WHERE kind = $1 AND (published OR NOT $2)
            ORDER BY sort_order ASC, title ASC
            "#
        )
        .bind(kind.as_str())
        .bind(published_only)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ContentItem::try_from).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ContentItem>> {
        let row = sqlx::query_as::<_, ContentRow>(
            "SELECT id, kind, title, data, sort_order, published, updated_by, updated_at FROM content_items WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ContentItem::try_from).transpose()
    }

    async fn upsert(&self, item: &ContentItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content_items (id, kind, title, data, sort_order, published, updated_by, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id)
            DO UPDATE SET
                kind = EXCLUDED.kind,
                title = EXCLUDED.title,
                data = EXCLUDED.data,
                sort_order = EXCLUDED.sort_order,
                published = EXCLUDED.published,
                updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(&item.id)
        .bind(item.kind.as_str())
        .bind(&item.title)
        .bind(&item.data)
        .bind(item.sort_order)
        .bind(item.published)
        .bind(&item.updated_by)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM content_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_sort_order(&self, id: &str, sort_order: i32, updated_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE content_items SET sort_order = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(sort_order)
            .bind(updated_at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
