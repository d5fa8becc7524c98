//! The closed catalog of back-office capability tokens.
//!
//! Every token is dot-namespaced (`"blog.publish"`) and serialized as that
//! string, both in the persisted `admin_user` record and on the console.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// A set of permissions. Duplicates collapse and iteration order is stable.
pub type PermissionSet = BTreeSet<Permission>;

/// A single capability gating one back-office action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    DashboardView,
    AdminView,
    UsersView,
    UsersCreate,
    UsersEdit,
    UsersDelete,
    UsersManageRoles,
    BlogView,
    BlogCreate,
    BlogEdit,
    BlogDelete,
    BlogPublish,
    VoicesView,
    VoicesCreate,
    VoicesEdit,
    VoicesDelete,
    VoicesPublish,
    StoriesView,
    ContentView,
    ContentCreate,
    ContentEdit,
    ContentDelete,
    ContentPublish,
    ClimateDataView,
    MapsView,
    AnalyticsView,
    SystemSettings,
    SettingsView,
    SettingsManage,
    PermissionsManage,
}

impl Permission {
    pub const ALL: [Permission; 30] = [
        Permission::DashboardView,
        Permission::AdminView,
        Permission::UsersView,
        Permission::UsersCreate,
        Permission::UsersEdit,
        Permission::UsersDelete,
        Permission::UsersManageRoles,
        Permission::BlogView,
        Permission::BlogCreate,
        Permission::BlogEdit,
        Permission::BlogDelete,
        Permission::BlogPublish,
        Permission::VoicesView,
        Permission::VoicesCreate,
        Permission::VoicesEdit,
        Permission::VoicesDelete,
        Permission::VoicesPublish,
        Permission::StoriesView,
        Permission::ContentView,
        Permission::ContentCreate,
        Permission::ContentEdit,
        Permission::ContentDelete,
        Permission::ContentPublish,
        Permission::ClimateDataView,
        Permission::MapsView,
        Permission::AnalyticsView,
        Permission::SystemSettings,
        Permission::SettingsView,
        Permission::SettingsManage,
        Permission::PermissionsManage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::DashboardView => "dashboard.view",
            Permission::AdminView => "admin.view",
            Permission::UsersView => "users.view",
            Permission::UsersCreate => "users.create",
            Permission::UsersEdit => "users.edit",
            Permission::UsersDelete => "users.delete",
            Permission::UsersManageRoles => "users.manage_roles",
            Permission::BlogView => "blog.view",
            Permission::BlogCreate => "blog.create",
            Permission::BlogEdit => "blog.edit",
            Permission::BlogDelete => "blog.delete",
            Permission::BlogPublish => "blog.publish",
            Permission::VoicesView => "voices.view",
            Permission::VoicesCreate => "voices.create",
            Permission::VoicesEdit => "voices.edit",
            Permission::VoicesDelete => "voices.delete",
            Permission::VoicesPublish => "voices.publish",
            Permission::StoriesView => "stories.view",
            Permission::ContentView => "content.view",
            Permission::ContentCreate => "content.create",
            Permission::ContentEdit => "content.edit",
            Permission::ContentDelete => "content.delete",
            Permission::ContentPublish => "content.publish",
            Permission::ClimateDataView => "climate_data.view",
            Permission::MapsView => "maps.view",
            Permission::AnalyticsView => "analytics.view",
            Permission::SystemSettings => "system.settings",
            Permission::SettingsView => "settings.view",
            Permission::SettingsManage => "settings.manage",
            Permission::PermissionsManage => "permissions.manage",
        }
    }

    /// The area a token belongs to: `"blog"` for `blog.publish`.
    pub fn namespace(&self) -> &'static str {
        let token = self.as_str();
        match token.split_once('.') {
            Some((namespace, _)) => namespace,
            None => token,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::UnknownPermission(s.to_string()))
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_tokens_are_unique_and_dotted() {
        let tokens: BTreeSet<&str> = Permission::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(tokens.len(), Permission::ALL.len());
        for token in tokens {
            assert!(token.contains('.'), "token without namespace: {}", token);
        }
    }

    #[test]
    fn every_token_parses_back() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "blog.burn".parse::<Permission>().unwrap_err();
        assert!(matches!(err, AppError::UnknownPermission(ref t) if t == "blog.burn"));
        assert!("".parse::<Permission>().is_err());
        assert!("Blog.View".parse::<Permission>().is_err());
    }

    #[test]
    fn namespace_is_prefix_before_dot() {
        assert_eq!(Permission::BlogPublish.namespace(), "blog");
        assert_eq!(Permission::ClimateDataView.namespace(), "climate_data");
        assert_eq!(Permission::UsersManageRoles.namespace(), "users");
    }

    #[test]
    fn serializes_as_dotted_string() {
        let json = serde_json::to_string(&Permission::UsersManageRoles).unwrap();
        assert_eq!(json, "\"users.manage_roles\"");

        let parsed: Permission = serde_json::from_str("\"maps.view\"").unwrap();
        assert_eq!(parsed, Permission::MapsView);

        assert!(serde_json::from_str::<Permission>("\"maps.edit\"").is_err());
    }

    #[test]
    fn set_collapses_duplicates() {
        let set: PermissionSet = [
            Permission::BlogView,
            Permission::BlogView,
            Permission::DashboardView,
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }
}
