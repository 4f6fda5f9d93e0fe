//! Admin repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{enum_from_text, enum_to_text};
use crate::database::store::AdminStore;
use crate::models::admin::AdminUser;
use crate::utils::errors::{IdmcError, Result};

#[derive(FromRow)]
struct AdminRow {
    email: String,
    display_name: Option<String>,
    role: String,
    permissions: Vec<String>,
    status: String,
    invited_by: Option<String>,
    invited_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for AdminUser {
    type Error = IdmcError;

    fn try_from(row: AdminRow) -> Result<Self> {
        Ok(AdminUser {
            email: row.email,
            display_name: row.display_name,
            role: enum_from_text(&row.role)?,
            permissions: row
                .permissions
                .iter()
                .map(|p| enum_from_text(p))
                .collect::<Result<_>>()?,
            status: enum_from_text(&row.status)?,
            invited_by: row.invited_by,
            invited_at: row.invited_at,
            last_login_at: row.last_login_at,
            updated_at: row.updated_at,
        })
    }
}

fn permission_texts(admin: &AdminUser) -> Result<Vec<String>> {
    admin.permissions.iter().map(enum_to_text).collect()
}

#[derive(Clone, Debug)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for AdminRepository {
    async fn insert(&self, admin: &AdminUser) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO admins (email, display_name, role, permissions, status, invited_by, invited_at, last_login_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (email) DO NOTHING
            "#
        )
        .bind(&admin.email)
        .bind(&admin.display_name)
        .bind(enum_to_text(&admin.role)?)
        .bind(permission_texts(admin)?)
        .bind(enum_to_text(&admin.status)?)
        .bind(&admin.invited_by)
        .bind(admin.invited_at)
        .bind(admin.last_login_at)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(IdmcError::AdminAlreadyExists { email: admin.email.clone() });
        }

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT email, display_name, role, permissions, status, invited_by, invited_at, last_login_at, updated_at FROM admins WHERE email = $1"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AdminUser::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<AdminUser>> {
        let rows = sqlx::query_as::<_, AdminRow>(
            "SELECT email, display_name, role, permissions, status, invited_by, invited_at, last_login_at, updated_at FROM admins ORDER BY email ASC"
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AdminUser::try_from).collect()
    }

    async fn update(&self, admin: &AdminUser) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE admins
            SET display_name = $2,
                role = $3,
                permissions = $4,
                status = $5,
                last_login_at = $6,
                updated_at = $7
            WHERE email = $1
            "#
        )
        .bind(&admin.email)
        .bind(&admin.display_name)
        .bind(enum_to_text(&admin.role)?)
        .bind(permission_texts(admin)?)
        .bind(enum_to_text(&admin.status)?)
        .bind(admin.last_login_at)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(IdmcError::AdminNotFound { email: admin.email.clone() });
        }

        Ok(())
    }
}
