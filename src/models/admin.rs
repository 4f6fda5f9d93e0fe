//! Admin user model

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewRegistrations,
    ManageRegistrations,
    VerifyPayments,
    CheckIn,
    ManageContent,
    ManageSessions,
    ManageInquiries,
    ManageSettings,
    ManageAdmins,
}

impl Permission {
    pub const ALL: [Permission; 9] = [
        Permission::ViewRegistrations,
        Permission::ManageRegistrations,
        Permission::VerifyPayments,
        Permission::CheckIn,
        Permission::ManageContent,
        Permission::ManageSessions,
        Permission::ManageInquiries,
        Permission::ManageSettings,
        Permission::ManageAdmins,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    Volunteer,
}

impl AdminRole {
    /// Permissions granted by a role
    pub fn default_permissions(&self) -> BTreeSet<Permission> {
        match self {
            AdminRole::SuperAdmin => Permission::ALL.into_iter().collect(),
            AdminRole::Admin => Permission::ALL
                .into_iter()
                .filter(|p| *p != Permission::ManageAdmins)
                .collect(),
            AdminRole::Volunteer => [Permission::CheckIn, Permission::ViewRegistrations]
                .into_iter()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    Pending,
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub email: String,
    pub display_name: Option<String>,
    pub role: AdminRole,
    pub permissions: BTreeSet<Permission>,
    pub status: AdminStatus,
    pub invited_by: Option<String>,
    pub invited_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl AdminUser {
    pub fn can(&self, permission: Permission) -> bool {
        self.status == AdminStatus::Active && self.permissions.contains(&permission)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteAdminRequest {
    pub email: String,
    pub display_name: Option<String>,
    pub role: AdminRole,
}
