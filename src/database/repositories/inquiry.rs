//! Contact inquiry repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::database::store::InquiryStore;
use crate::models::inquiry::{ContactInquiry, InquiryStatus};
use crate::utils::errors::{IdmcError, Result};

const COLUMNS: &str = "id, name, email, subject, message, status, reply, replied_by, replied_at, created_at, updated_at";

#[derive(FromRow)]
struct InquiryRow {
    id: String,
    name: String,
    email: String,
    subject: String,
    message: String,
    status: String,
    reply: Option<String>,
    replied_by: Option<String>,
    replied_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InquiryRow> for ContactInquiry {
    type Error = IdmcError;

    fn try_from(row: InquiryRow) -> Result<Self> {
        let status = InquiryStatus::parse(&row.status)
            .ok_or_else(|| IdmcError::Validation(format!("Unknown inquiry status: {}", row.status)))?;

        Ok(ContactInquiry {
            id: row.id,
            name: row.name,
            email: row.email,
            subject: row.subject,
            message: row.message,
            status,
            reply: row.reply,
            replied_by: row.replied_by,
            replied_at: row.replied_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone, Debug)]
pub struct InquiryRepository {
    pool: PgPool,
}

impl InquiryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InquiryStore for InquiryRepository {
    async fn insert(&self, inquiry: &ContactInquiry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contact_inquiries (id, name, email, subject, message, status, reply, replied_by, replied_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#
        )
        .bind(&inquiry.id)
        .bind(&inquiry.name)
        .bind(&inquiry.email)
        .bind(&inquiry.subject)
        .bind(&inquiry.message)
        .bind(inquiry.status.as_str())
        .bind(&inquiry.reply)
        .bind(&inquiry.replied_by)
        .bind(inquiry.replied_at)
        .bind(inquiry.created_at)
        .bind(inquiry.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ContactInquiry>> {
        let row = sqlx::query_as::<_, InquiryRow>(&format!(
            "SELECT {} FROM contact_inquiries WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ContactInquiry::try_from).transpose()
    }

    async fn list(&self, status: Option<InquiryStatus>) -> Result<Vec<ContactInquiry>> {
        let rows = sqlx::query_as::<_, InquiryRow>(&format!(
            "SELECT {} FROM contact_inquiries WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ContactInquiry::try_from).collect()
    }

    async fn update(&self, inquiry: &ContactInquiry) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE contact_inquiries
            SET status = $2, reply = $3, replied_by = $4, replied_at = $5, updated_at = $6
            WHERE id = $1
            "#
        )
        .bind(&inquiry.id)
        .bind(inquiry.status.as_str())
        .bind(&inquiry.reply)
        .bind(&inquiry.replied_by)
        .bind(inquiry.replied_at)
        .bind(inquiry.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(IdmcError::InquiryNotFound { inquiry_id: inquiry.id.clone() });
        }

        Ok(())
    }
}
