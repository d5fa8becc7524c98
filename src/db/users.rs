//! SQLite-backed admin user directory.
//!
//! Stands in for the literal demo credential: login looks the email up,
//! checks the Argon2 hash and materializes the role's permission set.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::models::{AdminUser, AdminUserRow};
use super::DbPool;
use crate::auth::service::{AuthenticationService, Credential};
use crate::auth::{password, Identity, Role};
use crate::error::{AppError, AppResult};

const USER_COLUMNS: &str =
    "id, email, display_name, password, role, is_active, created_at, updated_at, created_by, last_login";

#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub email: String,
    pub display_name: Option<String>,
    pub password: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct UserDirectory {
    db: DbPool,
}

impl UserDirectory {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<AdminUserRow>> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {} FROM admin_users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    pub async fn get(&self, id: &str) -> AppResult<AdminUser> {
        let mut conn = self.db.acquire().await?;
        fetch_row(&mut conn, id).await.map(AdminUser::from)
    }

    pub async fn list_users(&self) -> AppResult<Vec<AdminUser>> {
        let rows = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {} FROM admin_users ORDER BY created_at DESC, email ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(AdminUser::from).collect())
    }

    pub async fn create_user(&self, user: NewAdminUser, created_by: Option<&str>) -> AppResult<AdminUser> {
        let email = normalize_email(&user.email);
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation(format!("Invalid email address: '{}'", user.email)));
        }
        password::check_policy(&user.password)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::Validation(format!("Email '{}' already exists", email)));
        }

        let display_name = user
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        let id = Uuid::new_v4().to_string();
        let password_hash = password::hash(&user.password)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO admin_users (id, email, display_name, password, role, is_active, created_at, updated_at, created_by)
             VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&email)
        .bind(display_name.as_deref())
        .bind(&password_hash)
        .bind(user.role.as_str())
        .bind(&now)
        .bind(&now)
        .bind(created_by)
        .execute(&self.db)
        .await?;

        tracing::info!(user_id = %id, role = %user.role, "Admin user created");
        self.get(&id).await
    }

    /// The super admin check and the write share one transaction.
    pub async fn update_role(&self, id: &str, role: Role) -> AppResult<AdminUser> {
        let mut tx = self.db.begin().await?;
        let existing = fetch_row(&mut tx, id).await?;

        if existing.role == Role::SuperAdmin.as_str() && existing.is_active && role != Role::SuperAdmin {
            ensure_other_super_admin(&mut tx, id).await?;
        }

        sqlx::query("UPDATE admin_users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %id, from = %existing.role, to = %role, "Admin role changed");
        self.get(id).await
    }

    pub async fn set_active(&self, id: &str, active: bool) -> AppResult<AdminUser> {
        let mut tx = self.db.begin().await?;
        let existing = fetch_row(&mut tx, id).await?;

        if !active && existing.is_active && existing.role == Role::SuperAdmin.as_str() {
            ensure_other_super_admin(&mut tx, id).await?;
        }

        sqlx::query("UPDATE admin_users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.get(id).await
    }

    async fn touch_last_login(&self, id: &str) -> AppResult<()> {
        sqlx::query("UPDATE admin_users SET last_login = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AuthenticationService for UserDirectory {
    async fn verify(&self, credential: &Credential) -> AppResult<Option<Identity>> {
        let Some(row) = self.find_by_email(&credential.email).await? else {
            return Ok(None);
        };
        if !row.is_active || !password::verify(&credential.password, &row.password) {
            return Ok(None);
        }
        let Some(identity) = row.to_identity() else {
            return Ok(None);
        };

        self.touch_last_login(&row.id).await?;
        Ok(Some(identity))
    }
}

async fn fetch_row(conn: &mut SqliteConnection, id: &str) -> AppResult<AdminUserRow> {
    sqlx::query_as::<_, AdminUserRow>(&format!(
        "SELECT {} FROM admin_users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

async fn ensure_other_super_admin(conn: &mut SqliteConnection, id: &str) -> AppResult<()> {
    let (others,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM admin_users WHERE role = 'super_admin' AND is_active = 1 AND id != ?",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    if others == 0 {
        return Err(AppError::Validation(
            "At least one active super_admin must remain".to_string(),
        ));
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
