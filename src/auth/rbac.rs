use super::identity::Identity;
use super::permission::Permission;
use super::role::{permissions_for, Role};
use crate::error::{AppError, AppResult};

/// Whether `identity` may perform an action gated by `permission`.
///
/// Checks the set captured on the identity, not the live role registry.
/// Nobody logged in means no permissions.
pub fn has_permission(identity: Option<&Identity>, permission: Permission) -> bool {
    identity.is_some_and(|user| user.has(permission))
}

/// Like [`has_permission`], for callers that refuse the action outright.
pub fn require_permission(identity: Option<&Identity>, permission: Permission) -> AppResult<()> {
    match identity {
        None => Err(AppError::AuthFailed),
        Some(user) if user.has(permission) => Ok(()),
        Some(_) => Err(AppError::PermissionDenied(permission)),
    }
}

/// Refuses to hand out `role` unless `identity` already holds every
/// permission it carries.
pub fn require_grantable(identity: Option<&Identity>, role: Role) -> AppResult<()> {
    let Some(user) = identity else {
        return Err(AppError::AuthFailed);
    };
    match permissions_for(role).into_iter().find(|p| !user.has(*p)) {
        Some(missing) => Err(AppError::PermissionDenied(missing)),
        None => Ok(()),
    }
}
