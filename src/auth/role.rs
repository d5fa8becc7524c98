//! Role registry: the static mapping from admin role to permission set.
//!
//! Each role is the union of a few named bundles. The higher roles are built
//! by adding bundles to the lower ones, so the superset chain
//! `super_admin ⊇ admin ⊇ moderator ⊇ content_manager ⊇ editor` holds by
//! construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::permission::{Permission, PermissionSet};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Moderator,
    Editor,
    ContentManager,
    AnalyticsViewer,
}

const BASELINE: &[Permission] = &[Permission::DashboardView];

const BLOG_AUTHORING: &[Permission] = &[
    Permission::BlogView,
    Permission::BlogCreate,
    Permission::BlogEdit,
    Permission::BlogDelete,
];

const BLOG_PUBLISHING: &[Permission] = &[Permission::BlogPublish];

const VOICES_AUTHORING: &[Permission] = &[
    Permission::VoicesView,
    Permission::VoicesCreate,
    Permission::VoicesEdit,
    Permission::VoicesDelete,
];

const VOICES_PUBLISHING: &[Permission] = &[Permission::VoicesPublish];

const USER_ADMINISTRATION: &[Permission] = &[
    Permission::AdminView,
    Permission::UsersView,
    Permission::UsersCreate,
    Permission::UsersEdit,
    Permission::UsersDelete,
    Permission::UsersManageRoles,
];

const ANALYTICS: &[Permission] = &[Permission::AnalyticsView];

const SYSTEM: &[Permission] = &[Permission::SystemSettings, Permission::PermissionsManage];

const SITE_CONTENT: &[Permission] = &[
    Permission::StoriesView,
    Permission::ContentView,
    Permission::ContentCreate,
    Permission::ContentEdit,
    Permission::ContentDelete,
    Permission::ContentPublish,
    Permission::ClimateDataView,
    Permission::MapsView,
];

impl Role {
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Moderator,
        Role::Editor,
        Role::ContentManager,
        Role::AnalyticsViewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Editor => "editor",
            Role::ContentManager => "content_manager",
            Role::AnalyticsViewer => "analytics_viewer",
        }
    }

    fn bundles(&self) -> &'static [&'static [Permission]] {
        match self {
            Role::Editor => &[BASELINE, BLOG_AUTHORING],
            Role::ContentManager => &[BASELINE, BLOG_AUTHORING, BLOG_PUBLISHING, VOICES_AUTHORING],
            Role::Moderator => &[
                BASELINE,
                BLOG_AUTHORING,
                BLOG_PUBLISHING,
                VOICES_AUTHORING,
                VOICES_PUBLISHING,
            ],
            Role::Admin => &[
                BASELINE,
                BLOG_AUTHORING,
                BLOG_PUBLISHING,
                VOICES_AUTHORING,
                VOICES_PUBLISHING,
                USER_ADMINISTRATION,
                ANALYTICS,
                SYSTEM,
            ],
            Role::SuperAdmin => &[
                BASELINE,
                BLOG_AUTHORING,
                BLOG_PUBLISHING,
                VOICES_AUTHORING,
                VOICES_PUBLISHING,
                USER_ADMINISTRATION,
                ANALYTICS,
                SYSTEM,
                SITE_CONTENT,
            ],
            Role::AnalyticsViewer => &[BASELINE, ANALYTICS],
        }
    }

    /// Display metadata used when listing users and roles.
    pub fn definition(&self) -> RoleDefinition {
        let (name, icon, color) = match self {
            Role::SuperAdmin => ("Super Admin", "👑", "bg-purple-600"),
            Role::Admin => ("Admin", "⚡", "bg-blue-600"),
            Role::Moderator => ("Moderator", "🛡️", "bg-red-600"),
            Role::Editor => ("Editor", "✏️", "bg-teal-600"),
            Role::ContentManager => ("Content Manager", "📝", "bg-green-600"),
            Role::AnalyticsViewer => ("Analytics Viewer", "📊", "bg-yellow-600"),
        };
        RoleDefinition { name, icon, color }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| AppError::UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

/// The statically configured permission set of `role`.
pub fn permissions_for(role: Role) -> PermissionSet {
    role.bundles()
        .iter()
        .flat_map(|bundle| bundle.iter().copied())
        .collect()
}

/// Looks up a role by its stored name. Unknown names grant nothing.
pub fn permissions_for_name(name: &str) -> PermissionSet {
    match name.parse::<Role>() {
        Ok(role) => permissions_for(role),
        Err(_) => {
            tracing::warn!(role = %name, "Unrecognized role; granting no permissions");
            PermissionSet::new()
        }
    }
}

/// Display metadata for a stored role name, `None` when the name is unknown.
pub fn role_definition(name: &str) -> Option<RoleDefinition> {
    name.parse::<Role>().ok().map(|role| role.definition())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(perms: &[Permission]) -> PermissionSet {
        perms.iter().copied().collect()
    }

    #[test]
    fn every_role_includes_dashboard_access() {
        for role in Role::ALL {
            let perms = permissions_for(role);
            assert!(!perms.is_empty(), "{} has no permissions", role);
            assert!(perms.contains(&Permission::DashboardView), "{} lacks dashboard.view", role);
        }
    }

    #[test]
    fn editor_matches_configured_set() {
        assert_eq!(
            permissions_for(Role::Editor),
            set(&[
                Permission::DashboardView,
                Permission::BlogView,
                Permission::BlogCreate,
                Permission::BlogEdit,
                Permission::BlogDelete,
            ])
        );
    }

    #[test]
    fn content_manager_cannot_publish_voices() {
        let perms = permissions_for(Role::ContentManager);
        assert!(perms.contains(&Permission::BlogPublish));
        assert!(perms.contains(&Permission::VoicesDelete));
        assert!(!perms.contains(&Permission::VoicesPublish));
        assert_eq!(perms.len(), 10);
    }

    #[test]
    fn analytics_viewer_is_minimal() {
        assert_eq!(
            permissions_for(Role::AnalyticsViewer),
            set(&[Permission::DashboardView, Permission::AnalyticsView])
        );
    }

    #[test]
    fn admin_and_super_admin_sizes() {
        assert_eq!(permissions_for(Role::Moderator).len(), 11);
        assert_eq!(permissions_for(Role::Admin).len(), 20);
        assert_eq!(permissions_for(Role::SuperAdmin).len(), 28);
    }

    #[test]
    fn higher_roles_are_supersets() {
        let chain = [
            Role::SuperAdmin,
            Role::Admin,
            Role::Moderator,
            Role::ContentManager,
            Role::Editor,
        ];
        for pair in chain.windows(2) {
            let higher = permissions_for(pair[0]);
            let lower = permissions_for(pair[1]);
            assert!(lower.is_subset(&higher), "{} is not a superset of {}", pair[0], pair[1]);
        }
        assert!(permissions_for(Role::AnalyticsViewer).is_subset(&permissions_for(Role::Admin)));
    }

    #[test]
    fn settings_tokens_are_granted_to_no_role() {
        for role in Role::ALL {
            let perms = permissions_for(role);
            assert!(!perms.contains(&Permission::SettingsView));
            assert!(!perms.contains(&Permission::SettingsManage));
        }
    }

    #[test]
    fn unknown_role_name_fails_closed() {
        assert!(permissions_for_name("root").is_empty());
        assert!(permissions_for_name("").is_empty());
        assert!(permissions_for_name("SUPER_ADMIN").is_empty());
        assert_eq!(permissions_for_name("editor"), permissions_for(Role::Editor));
    }

    #[test]
    fn role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert!(matches!("operator".parse::<Role>(), Err(AppError::UnknownRole(_))));
    }

    #[test]
    fn definitions_cover_every_role() {
        assert_eq!(role_definition("super_admin").unwrap().name, "Super Admin");
        assert_eq!(role_definition("analytics_viewer").unwrap().icon, "📊");
        assert_eq!(role_definition("moderator").unwrap().color, "bg-red-600");
        assert!(role_definition("guest").is_none());
    }
}
