//! Session repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{enum_from_text, enum_to_text};
use crate::database::store::SessionStore;
use crate::models::session::{Session, SeatReservation};
use crate::utils::errors::{IdmcError, Result};

const COLUMNS: &str = "id, title, description, session_type, speaker_ids, venue, starts_at, ends_at, \
    capacity, registered_count, time_slot, created_at, updated_at";

#[derive(FromRow)]
struct SessionRow {
    id: String,
    title: String,
    description: Option<String>,
    session_type: String,
    speaker_ids: Vec<String>,
    venue: Option<String>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    capacity: Option<i32>,
    registered_count: i32,
    time_slot: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for Session {
    type Error = IdmcError;

    fn try_from(row: SessionRow) -> Result<Self> {
        Ok(Session {
            id: row.id,
            title: row.title,
            description: row.description,
            session_type: enum_from_text(&row.session_type)?,
            speaker_ids: row.speaker_ids,
            venue: row.venue,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            capacity: row.capacity,
            registered_count: row.registered_count,
            time_slot: row.time_slot,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone, Debug)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 > 0)
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn insert(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, title, description, session_type, speaker_ids, venue, starts_at, ends_at,
                capacity, registered_count, time_slot, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#
        )
        .bind(&session.id)
        .bind(&session.title)
        .bind(&session.description)
        .bind(enum_to_text(&session.session_type)?)
        .bind(&session.speaker_ids)
        .bind(&session.venue)
        .bind(session.starts_at)
        .bind(session.ends_at)
        .bind(session.capacity)
        .bind(session.registered_count)
        .bind(&session.time_slot)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!("SELECT {} FROM sessions WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Session::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {} FROM sessions ORDER BY starts_at ASC NULLS FIRST, title ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Session::try_from).collect()
    }

    async fn update(&self, session: &Session) -> Result<()> {
        // registered_count is owned by reserve_seat/release_seat
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET title = $2,
                description = $3,
                speaker_ids = $4,
                venue = $5,
                starts_at = $6,
                ends_at = $7,
                capacity = $8,
                time_slot = $9,
                updated_at = $10
            WHERE id = $1
            "#
        )
        .bind(&session.id)
        .bind(&session.title)
        .bind(&session.description)
        .bind(&session.speaker_ids)
        .bind(&session.venue)
        .bind(session.starts_at)
        .bind(session.ends_at)
        .bind(session.capacity)
        .bind(&session.time_slot)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(IdmcError::WorkshopNotFound { session_id: session.id.clone() });
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reserve_seat(&self, id: &str) -> Result<SeatReservation> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET registered_count = registered_count + 1, updated_at = NOW()
            WHERE id = $1 AND (capacity IS NULL OR registered_count < capacity)
            "#
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(SeatReservation::Reserved);
        }

        if self.exists(id).await? {
            Ok(SeatReservation::Full)
        } else {
            Err(IdmcError::WorkshopNotFound { session_id: id.to_string() })
        }
    }

    async fn release_seat(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE sessions SET registered_count = GREATEST(registered_count - 1, 0), updated_at = NOW() WHERE id = $1"
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(IdmcError::WorkshopNotFound { session_id: id.to_string() });
        }

        Ok(())
    }
}
