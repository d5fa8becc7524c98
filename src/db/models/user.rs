use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{Identity, Role};

/// A row of `admin_users`, password hash included.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminUserRow {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub password: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
    pub last_login: Option<String>,
}

/// Public view of an admin user (no password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
    pub last_login: Option<String>,
}

impl From<AdminUserRow> for AdminUser {
    fn from(row: AdminUserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            role: row.role,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            last_login: row.last_login,
        }
    }
}

impl AdminUserRow {
    /// Materializes the session identity for this user.
    /// A row whose role is not recognized yields no identity.
    pub fn to_identity(&self) -> Option<Identity> {
        let role: Role = match self.role.parse() {
            Ok(role) => role,
            Err(_) => {
                tracing::warn!(user_id = %self.id, role = %self.role, "Admin user has an unrecognized role");
                return None;
            }
        };

        let mut identity = Identity::new(self.id.clone(), self.email.clone(), role);
        identity.display_name = self.display_name.clone();
        identity.created_at = parse_timestamp(&self.created_at);
        identity.created_by = self.created_by.clone();
        identity.is_active = Some(self.is_active);
        Some(identity)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
