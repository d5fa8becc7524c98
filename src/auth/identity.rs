use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::permission::{Permission, PermissionSet};
use super::role::{permissions_for, Role};

/// An authenticated admin user as held by the session store.
///
/// This is also the `admin_user` record persisted between runs. The
/// permission set is copied from the role registry at login and is not
/// re-derived afterwards: a role change takes effect on the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: Role,
    pub permissions: PermissionSet,
    pub last_login: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Identity {
    /// Builds an identity holding the full permission set of `role`.
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: None,
            role,
            permissions: permissions_for(role),
            last_login: Utc::now(),
            avatar: None,
            created_at: None,
            created_by: None,
            is_active: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Name shown in listings and activity entries.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn new_identity_materializes_role_permissions() {
        let user = Identity::new("u-1", "editor@beyond2c.org", Role::Editor);
        assert_eq!(user.permissions, permissions_for(Role::Editor));
        assert!(user.has(Permission::BlogEdit));
        assert!(!user.has(Permission::BlogPublish));
    }

    #[test]
    fn label_prefers_display_name() {
        let user = Identity::new("u-1", "a@beyond2c.org", Role::Admin);
        assert_eq!(user.label(), "a@beyond2c.org");
        let user = user.with_display_name("Ayşe");
        assert_eq!(user.label(), "Ayşe");
    }

    #[test]
    fn persisted_record_uses_camel_case_keys() {
        let user = Identity::new("1", "admin@beyond2c.org", Role::AnalyticsViewer)
            .with_display_name("Admin User");
        let json: Value = serde_json::to_value(&user).unwrap();

        assert_eq!(json["id"], "1");
        assert_eq!(json["displayName"], "Admin User");
        assert_eq!(json["role"], "analytics_viewer");
        assert!(json["lastLogin"].is_string());
        assert_eq!(
            json["permissions"],
            serde_json::json!(["dashboard.view", "analytics.view"])
        );
        assert!(json.get("avatar").is_none());
    }

    #[test]
    fn record_without_optional_fields_parses() {
        let raw = r#"{
            "id": "7",
            "email": "mod@beyond2c.org",
            "role": "moderator",
            "permissions": ["dashboard.view", "voices.publish", "dashboard.view"],
            "lastLogin": "2024-06-10T09:30:00Z"
        }"#;
        let user: Identity = serde_json::from_str(raw).unwrap();
        assert_eq!(user.role, Role::Moderator);
        assert_eq!(user.permissions.len(), 2);
        assert!(user.display_name.is_none());
        assert!(user.is_active.is_none());
    }

    #[test]
    fn record_with_unknown_role_is_rejected() {
        let raw = r#"{
            "id": "7",
            "email": "x@beyond2c.org",
            "role": "root",
            "permissions": [],
            "lastLogin": "2024-06-10T09:30:00Z"
        }"#;
        assert!(serde_json::from_str::<Identity>(raw).is_err());
    }
}
