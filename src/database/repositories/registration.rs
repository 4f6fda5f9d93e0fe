//! Registration repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::database::store::RegistrationStore;
use crate::models::registration::*;
use crate::utils::errors::{IdmcError, Result};

const COLUMNS: &str = "id, short_code, short_code_suffix, primary_attendee, additional_attendees, category, \
    church_name, church_city, workshop_selections, payment, invoice, status, attendee_check_ins, \
    checked_in, checked_in_at, communications, payment_deadline, version, created_at, updated_at";

#[derive(FromRow)]
struct RegistrationRow {
    id: String,
    short_code: String,
    short_code_suffix: String,
    primary_attendee: Json<Attendee>,
    additional_attendees: Json<Vec<Attendee>>,
    category: String,
    church_name: String,
    church_city: Option<String>,
    workshop_selections: Json<Vec<WorkshopSelection>>,
    payment: Json<Payment>,
    invoice: Option<Json<Invoice>>,
    status: String,
    attendee_check_ins: Json<Vec<AttendeeCheckIn>>,
    checked_in: bool,
    checked_in_at: Option<DateTime<Utc>>,
    communications: Json<CommunicationFlags>,
    payment_deadline: DateTime<Utc>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = IdmcError;

    fn try_from(row: RegistrationRow) -> Result<Self> {
        Ok(Registration {
            id: row.id,
            short_code: row.short_code,
            short_code_suffix: row.short_code_suffix,
            primary_attendee: row.primary_attendee.0,
            additional_attendees: row.additional_attendees.0,
            category: row.category.parse()?,
            church_name: row.church_name,
            church_city: row.church_city,
            workshop_selections: row.workshop_selections.0,
            payment: row.payment.0,
            invoice: row.invoice.map(|invoice| invoice.0),
            status: row.status.parse()?,
            attendee_check_ins: row.attendee_check_ins.0,
            checked_in: row.checked_in,
            checked_in_at: row.checked_in_at,
            communications: row.communications.0,
            payment_deadline: row.payment_deadline,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_registrations(rows: Vec<RegistrationRow>) -> Result<Vec<Registration>> {
    rows.into_iter().map(Registration::try_from).collect()
}

fn attendee_emails(registration: &Registration) -> Vec<String> {
    registration.attendees().map(|a| a.email.clone()).collect()
}

#[derive(Clone, Debug)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    async fn insert(&self, registration: &Registration) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO registrations (id, short_code, short_code_suffix, primary_email, attendee_emails,
                primary_attendee, additional_attendees, category, church_name, church_city,
                workshop_selections, payment, invoice, status, attendee_check_ins, checked_in,
                checked_in_at, communications, payment_deadline, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            "#
        )
        .bind(&registration.id)
        .bind(&registration.short_code)
        .bind(&registration.short_code_suffix)
        .bind(&registration.primary_attendee.email)
        .bind(attendee_emails(registration))
        .bind(Json(&registration.primary_attendee))
        .bind(Json(&registration.additional_attendees))
        .bind(registration.category.as_str())
        .bind(&registration.church_name)
        .bind(&registration.church_city)
        .bind(Json(&registration.workshop_selections))
        .bind(Json(&registration.payment))
        .bind(registration.invoice.as_ref().map(Json))
        .bind(registration.status.as_str())
        .bind(Json(&registration.attendee_check_ins))
        .bind(registration.checked_in)
        .bind(registration.checked_in_at)
        .bind(Json(&registration.communications))
        .bind(registration.payment_deadline)
        .bind(registration.version)
        .bind(registration.created_at)
        .bind(registration.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some("idx_registrations_primary_email") => {
                IdmcError::DuplicateEmail { email: registration.primary_attendee.email.clone() }
            }
            _ => IdmcError::Database(e),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {} FROM registrations WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Registration::try_from).transpose()
    }

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {} FROM registrations WHERE short_code = $1",
            COLUMNS
        ))
        .bind(short_code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Registration::try_from).transpose()
    }

    async fn find_by_suffix(&self, suffix: &str) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {} FROM registrations WHERE short_code_suffix = $1 ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(suffix)
        .fetch_all(&self.pool)
        .await?;

        into_registrations(rows)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {} FROM registrations WHERE $1 = ANY(attendee_emails) ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        into_registrations(rows)
    }

    async fn primary_email_exists(&self, email: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE primary_email = $1"
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }

    async fn short_code_exists(&self, short_code: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE short_code = $1"
        )
        .bind(short_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }

    async fn list(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {} FROM registrations WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at DESC, id DESC LIMIT $2",
            COLUMNS
        ))
        .bind(filter.status.map(|status| status.as_str()))
        .bind(filter.limit.unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        into_registrations(rows)
    }

    async fn list_waitlisted(&self, session_id: &str) -> Result<Vec<Registration>> {
        let waitlisted_seat = serde_json::json!([{ "session_id": session_id, "status": "waitlisted" }]);
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {} FROM registrations WHERE workshop_selections @> $1 ORDER BY created_at ASC, id ASC",
            COLUMNS
        ))
        .bind(waitlisted_seat)
        .fetch_all(&self.pool)
        .await?;

        into_registrations(rows)
    }

    async fn replace(&self, registration: &Registration) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET primary_email = $3,
                attendee_emails = $4,
                primary_attendee = $5,
                additional_attendees = $6,
                category = $7,
                church_name = $8,
                church_city = $9,
                workshop_selections = $10,
                payment = $11,
                invoice = $12,
                status = $13,
                attendee_check_ins = $14,
                checked_in = $15,
                checked_in_at = $16,
                communications = $17,
                payment_deadline = $18,
                updated_at = $19,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#
        )
        .bind(&registration.id)
        .bind(registration.version)
        .bind(&registration.primary_attendee.email)
        .bind(attendee_emails(registration))
        .bind(Json(&registration.primary_attendee))
        .bind(Json(&registration.additional_attendees))
        .bind(registration.category.as_str())
        .bind(&registration.church_name)
        .bind(&registration.church_city)
        .bind(Json(&registration.workshop_selections))
        .bind(Json(&registration.payment))
        .bind(registration.invoice.as_ref().map(Json))
        .bind(registration.status.as_str())
        .bind(Json(&registration.attendee_check_ins))
        .bind(registration.checked_in)
        .bind(registration.checked_in_at)
        .bind(Json(&registration.communications))
        .bind(registration.payment_deadline)
        .bind(registration.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        if self.find_by_id(&registration.id).await?.is_none() {
            return Err(IdmcError::RegistrationNotFound {
                registration_id: registration.id.clone(),
            });
        }

        Ok(false)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM registrations")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM registrations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
