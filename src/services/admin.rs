//! Admin user management and permission checks

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::database::store::AdminStore;
use crate::models::activity::NewActivityLogEntry;
use crate::models::admin::{AdminRole, AdminStatus, AdminUser, InviteAdminRequest, Permission};
use crate::services::activity::ActivityService;
use crate::utils::errors::{IdmcError, Result};
use crate::utils::helpers::{is_valid_email, normalize_email, normalize_whitespace};

#[derive(Clone)]
pub struct AdminService {
    admins: Arc<dyn AdminStore>,
    activity: ActivityService,
}

impl AdminService {
    pub fn new(admins: Arc<dyn AdminStore>, activity: ActivityService) -> Self {
        Self { admins, activity }
    }

    async fn get(&self, email: &str) -> Result<AdminUser> {
        let email = normalize_email(email);
        self.admins
            .find_by_email(&email)
            .await?
            .ok_or(IdmcError::AdminNotFound { email })
    }

    /// Invite a new admin. The account stays pending until first activation.
    pub async fn invite_admin(&self, request: InviteAdminRequest, invited_by: &str) -> Result<AdminUser> {
        let email = normalize_email(&request.email);
        if !is_valid_email(&email) {
            return Err(IdmcError::Validation(format!("Invalid email: {}", email)));
        }
        if self.admins.find_by_email(&email).await?.is_some() {
            return Err(IdmcError::AdminAlreadyExists { email });
        }

        let now = Utc::now();
        let admin = AdminUser {
            email,
            display_name: request
                .display_name
                .map(|name| normalize_whitespace(&name))
                .filter(|name| !name.is_empty()),
            role: request.role,
            permissions: request.role.default_permissions(),
            status: AdminStatus::Pending,
            invited_by: Some(invited_by.to_string()),
            invited_at: now,
            last_login_at: None,
            updated_at: now,
        };

        self.admins.insert(&admin).await?;
        info!(email = %admin.email, role = ?admin.role, invited_by = invited_by, "Admin invited");
        self.activity
            .log(
                NewActivityLogEntry::new(invited_by, "invite_admin", "admin", Some(&admin.email))
                    .with_details(serde_json::json!({ "role": admin.role })),
            )
            .await;

        Ok(admin)
    }

    pub async fn activate_admin(&self, email: &str, by: &str) -> Result<AdminUser> {
        self.set_status(email, AdminStatus::Active, by).await
    }

    pub async fn deactivate_admin(&self, email: &str, by: &str) -> Result<AdminUser> {
        if normalize_email(email) == normalize_email(by) {
            return Err(IdmcError::PermissionDenied("Admins cannot deactivate themselves".to_string()));
        }
        self.set_status(email, AdminStatus::Inactive, by).await
    }

    async fn set_status(&self, email: &str, status: AdminStatus, by: &str) -> Result<AdminUser> {
        let mut admin = self.get(email).await?;
        admin.status = status;
        admin.updated_at = Utc::now();
        self.admins.update(&admin).await?;

        let action = match status {
            AdminStatus::Active => "activate_admin",
            AdminStatus::Inactive => "deactivate_admin",
            AdminStatus::Pending => "reset_admin",
        };
        self.activity
            .log(NewActivityLogEntry::new(by, action, "admin", Some(&admin.email)))
            .await;
        Ok(admin)
    }

    /// Change role; permissions are reset to the role's defaults
    pub async fn update_role(&self, email: &str, role: AdminRole, by: &str) -> Result<AdminUser> {
        let mut admin = self.get(email).await?;
        let previous = admin.role;
        admin.role = role;
        admin.permissions = role.default_permissions();
        admin.updated_at = Utc::now();
        self.admins.update(&admin).await?;

        self.activity
            .log(
                NewActivityLogEntry::new(by, "update_role", "admin", Some(&admin.email))
                    .with_details(serde_json::json!({ "from": previous, "to": role })),
            )
            .await;
        Ok(admin)
    }

    /// Stamp a sign-in. A pending admin becomes active on first sign-in.
    pub async fn record_login(&self, email: &str) -> Result<AdminUser> {
        let mut admin = self.get(email).await?;
        if admin.status == AdminStatus::Inactive {
            warn!(email = %admin.email, "Sign-in attempt by inactive admin");
            return Err(IdmcError::PermissionDenied(format!("{} is inactive", admin.email)));
        }

        let now = Utc::now();
        if admin.status == AdminStatus::Pending {
            admin.status = AdminStatus::Active;
        }
        admin.last_login_at = Some(now);
        admin.updated_at = now;
        self.admins.update(&admin).await?;
        Ok(admin)
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminUser>> {
        self.admins.list().await
    }

    /// The active admin behind `email`, if they hold `permission`
    pub async fn require_permission(&self, email: &str, permission: Permission) -> Result<AdminUser> {
        let admin = match self.get(email).await {
            Ok(admin) => admin,
            Err(IdmcError::AdminNotFound { email }) => {
                return Err(IdmcError::PermissionDenied(format!("{} is not an admin", email)));
            }
            Err(e) => return Err(e),
        };

        if !admin.can(permission) {
            warn!(email = %admin.email, permission = ?permission, "Permission denied");
            return Err(IdmcError::PermissionDenied(format!(
                "{} lacks {:?}",
                admin.email, permission
            )));
        }
        Ok(admin)
    }
}
