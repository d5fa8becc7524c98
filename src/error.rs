use thiserror::Error;

use crate::auth::permission::Permission;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Permission denied: '{0}' is required")]
    PermissionDenied(Permission),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures caused by the caller's input or session rather than
    /// by storage or internal faults.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::AuthFailed
                | AppError::PermissionDenied(_)
                | AppError::NotFound(_)
                | AppError::Validation(_)
                | AppError::UnknownRole(_)
                | AppError::UnknownPermission(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_names_the_token() {
        let err = AppError::PermissionDenied(Permission::UsersCreate);
        assert_eq!(err.to_string(), "Permission denied: 'users.create' is required");
        assert!(err.is_user_facing());
    }

    #[test]
    fn internal_errors_are_not_user_facing() {
        assert!(!AppError::Internal("boom".to_string()).is_user_facing());
        assert!(!AppError::Database(sqlx::Error::RowNotFound).is_user_facing());
    }
}
