use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::auth::service::{DEMO_EMAIL, DEMO_PASSWORD};
use crate::auth::Role;
use crate::config::Config;

pub mod audit;
pub mod models;
pub mod users;

pub type DbPool = SqlitePool;

pub const MEMORY_PATH: &str = ":memory:";

pub async fn init(cfg: &Config) -> Result<DbPool> {
    let pool = connect(&cfg.database.path).await?;
    tracing::info!("Database connected: {}", cfg.database.path);
    Ok(pool)
}

/// Opens the database at `path` and applies migrations.
///
/// `:memory:` gives a private in-memory database held by a single
/// connection that is never recycled.
pub async fn connect(path: &str) -> Result<DbPool> {
    let pool = if path == MEMORY_PATH {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?
    } else {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?
    };

    sqlx::migrate!("./src/db/migrations").run(&pool).await?;
    Ok(pool)
}

/// Create the default super admin if the directory is empty.
/// Returns whether an account was created.
pub async fn seed_admin(pool: &DbPool) -> Result<bool> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin_users")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(false);
    }

    let directory = users::UserDirectory::new(pool.clone());
    directory
        .create_user(
            users::NewAdminUser {
                email: DEMO_EMAIL.to_string(),
                display_name: Some("Admin User".to_string()),
                password: DEMO_PASSWORD.to_string(),
                role: Role::SuperAdmin,
            },
            None,
        )
        .await?;

    tracing::warn!(
        "Created default admin user ({} / {}). Change the password immediately in production!",
        DEMO_EMAIL,
        DEMO_PASSWORD
    );
    Ok(true)
}
