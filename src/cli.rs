//! Admin console: the command surface over the session store, the user
//! directory and the activity log.
//!
//! Every command except `login`, `logout`, `status` and `roles` checks the
//! current session's permissions before touching anything.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::jwt::SessionTokens;
use crate::auth::rbac::{require_grantable, require_permission};
use crate::auth::service::{AuthenticationService, StaticCredentialService};
use crate::auth::{Permission, Role};
use crate::config::{AuthBackend, Config};
use crate::db::audit::{self, ActivityFilter};
use crate::db::models::{NewActivity, TargetType};
use crate::db::users::{NewAdminUser, UserDirectory};
use crate::db::{self, DbPool};
use crate::error::AppError;
use crate::session::{SessionState, SessionStore, SqliteStorage};

/// Beyond 2°C admin console
#[derive(Parser, Debug)]
#[command(name = "beyond2c-admin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file (defaults to ./config.{toml,yaml,json} if present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in and persist the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "BEYOND2C_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show who is logged in
    Status,
    /// Exit 0 if the current session holds PERMISSION
    Check { permission: Permission },
    /// List roles and what they grant
    Roles {
        /// Show a single role
        role: Option<Role>,
    },
    /// Manage admin users
    #[command(subcommand)]
    Users(UsersCommand),
    /// Show the admin activity log
    Activity {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = audit::DEFAULT_PER_PAGE)]
        per_page: i64,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        action: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum UsersCommand {
    /// List admin users
    List,
    /// Create an admin user
    Add {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        role: Role,
        #[arg(short, long, env = "BEYOND2C_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Change a user's role
    SetRole { id: String, role: Role },
    /// Disable a user's login
    Deactivate { id: String },
    /// Re-enable a user's login
    Activate { id: String },
}

/// Everything a command needs, passed in explicitly.
pub struct Console {
    pub store: SessionStore,
    pub directory: UserDirectory,
    pub db: DbPool,
}

impl Console {
    pub fn new(store: SessionStore, directory: UserDirectory, db: DbPool) -> Self {
        Self { store, directory, db }
    }

    /// Opens the database, seeds the default admin and restores the session.
    pub async fn open(cfg: &Config) -> Result<Self> {
        let db = db::init(cfg).await?;
        db::seed_admin(&db).await?;

        let directory = UserDirectory::new(db.clone());
        let authenticator: Arc<dyn AuthenticationService> = match cfg.auth.backend {
            AuthBackend::Directory => Arc::new(directory.clone()),
            AuthBackend::Demo => Arc::new(StaticCredentialService::demo()?),
        };
        let tokens = SessionTokens::new(cfg.auth.token_secret.clone(), cfg.auth.session_expiry_hours);
        let mut store = SessionStore::new(Arc::new(SqliteStorage::new(db.clone())), authenticator, tokens);
        store.restore().await?;

        Ok(Self::new(store, directory, db))
    }

    /// Runs one command. Returns `false` when it was refused or failed in a
    /// way the operator caused.
    pub async fn execute(&mut self, command: Command, out: &mut dyn Write) -> Result<bool> {
        let result = match command {
            Command::Login { email, password } => self.login(&email, &password, out).await,
            Command::Logout => self.logout(out).await,
            Command::Status => self.status(out),
            Command::Check { permission } => self.check(permission, out),
            Command::Roles { role } => self.roles(role, out),
            Command::Users(cmd) => self.users(cmd, out).await,
            Command::Activity { page, per_page, user, action } => {
                let filter = ActivityFilter {
                    page: Some(page),
                    per_page: Some(per_page),
                    user_id: user,
                    action,
                    target_type: None,
                };
                self.activity(&filter, out).await
            }
        };

        match result {
            Ok(ok) => Ok(ok),
            Err(e) => match e.downcast_ref::<AppError>() {
                Some(app) if app.is_user_facing() => {
                    writeln!(out, "Error: {}", app)?;
                    Ok(false)
                }
                _ => Err(e),
            },
        }
    }

    async fn login(&mut self, email: &str, password: &str, out: &mut dyn Write) -> Result<bool> {
        if !self.store.login(email, password).await? {
            writeln!(out, "Invalid email or password")?;
            return Ok(false);
        }

        if let Some(identity) = self.store.identity() {
            let role = identity.role.definition();
            writeln!(out, "Logged in as {} ({} {})", identity.label(), role.icon, role.name)?;
            self.record(NewActivity::new(identity, "login", TargetType::System)).await;
        }
        Ok(true)
    }

    async fn logout(&mut self, out: &mut dyn Write) -> Result<bool> {
        if let Some(identity) = self.store.identity() {
            self.record(NewActivity::new(identity, "logout", TargetType::System)).await;
        }
        self.store.logout().await?;
        writeln!(out, "Logged out")?;
        Ok(true)
    }

    fn status(&self, out: &mut dyn Write) -> Result<bool> {
        match self.store.state() {
            SessionState::Authenticated(identity) => {
                let role = identity.role.definition();
                writeln!(out, "Logged in as {} <{}>", identity.label(), identity.email)?;
                writeln!(out, "Role:        {} {} ({})", role.icon, role.name, identity.role)?;
                writeln!(out, "Last login:  {}", identity.last_login.to_rfc3339())?;
                writeln!(out, "Permissions: {}", identity.permissions.len())?;
                for p in &identity.permissions {
                    writeln!(out, "  {}", p)?;
                }
                Ok(true)
            }
            SessionState::Loading | SessionState::Unauthenticated => {
                writeln!(out, "Not logged in")?;
                Ok(false)
            }
        }
    }

    fn check(&self, permission: Permission, out: &mut dyn Write) -> Result<bool> {
        let allowed = self.store.has_permission(permission);
        writeln!(out, "{}: {}", permission, if allowed { "allowed" } else { "denied" })?;
        Ok(allowed)
    }

    fn roles(&self, role: Option<Role>, out: &mut dyn Write) -> Result<bool> {
        let roles = match role {
            Some(role) => vec![role],
            None => Role::ALL.to_vec(),
        };
        for role in roles {
            let def = role.definition();
            let perms = crate::auth::permissions_for(role);
            writeln!(out, "{} {} ({}) - {} permissions", def.icon, def.name, role, perms.len())?;
            let tokens: Vec<&str> = perms.iter().map(|p| p.as_str()).collect();
            writeln!(out, "  {}", tokens.join(", "))?;
        }
        Ok(true)
    }

    async fn users(&mut self, cmd: UsersCommand, out: &mut dyn Write) -> Result<bool> {
        match cmd {
            UsersCommand::List => {
                require_permission(self.store.identity(), Permission::UsersView)?;
                let users = self.directory.list_users().await?;
                for user in &users {
                    writeln!(
                        out,
                        "{}  {:<32} {:<18} {}",
                        user.id,
                        user.email,
                        user.role,
                        if user.is_active { "active" } else { "inactive" }
                    )?;
                }
                writeln!(out, "{} users", users.len())?;
            }
            UsersCommand::Add { email, name, role, password } => {
                require_permission(self.store.identity(), Permission::UsersCreate)?;
                require_grantable(self.store.identity(), role)?;
                let actor_id = self.store.identity().map(|actor| actor.id.clone());
                let user = self
                    .directory
                    .create_user(
                        NewAdminUser { email, display_name: name, password, role },
                        actor_id.as_deref(),
                    )
                    .await?;
                writeln!(out, "Created {} ({}) as {}", user.email, user.id, user.role)?;
                self.record_user_action("users.create", &user.id, &user.email, json!({"role": user.role}))
                    .await;
            }
            UsersCommand::SetRole { id, role } => {
                require_permission(self.store.identity(), Permission::UsersManageRoles)?;
                require_grantable(self.store.identity(), role)?;
                let user = self.directory.update_role(&id, role).await?;
                writeln!(out, "{} is now {}", user.email, user.role)?;
                self.record_user_action("users.manage_roles", &user.id, &user.email, json!({"role": user.role}))
                    .await;
            }
            UsersCommand::Deactivate { id } => {
                require_permission(self.store.identity(), Permission::UsersEdit)?;
                let user = self.directory.set_active(&id, false).await?;
                writeln!(out, "{} deactivated", user.email)?;
                self.record_user_action("users.edit", &user.id, &user.email, json!({"is_active": false}))
                    .await;
            }
            UsersCommand::Activate { id } => {
                require_permission(self.store.identity(), Permission::UsersEdit)?;
                let user = self.directory.set_active(&id, true).await?;
                writeln!(out, "{} activated", user.email)?;
                self.record_user_action("users.edit", &user.id, &user.email, json!({"is_active": true}))
                    .await;
            }
        }
        Ok(true)
    }

    async fn activity(&self, filter: &ActivityFilter, out: &mut dyn Write) -> Result<bool> {
        require_permission(self.store.identity(), Permission::AdminView)?;
        let page = audit::list(&self.db, filter).await?;
        for entry in &page.data {
            let target = entry.target_name.as_deref().unwrap_or("-");
            writeln!(
                out,
                "{}  {:<20} {:<20} {} {}",
                entry.timestamp, entry.user_display_name, entry.action, entry.target_type, target
            )?;
        }
        writeln!(out, "page {} ({} per page), {} total", page.page, page.per_page, page.total)?;
        Ok(true)
    }

    async fn record_user_action(&self, action: &str, target_id: &str, target_name: &str, details: serde_json::Value) {
        if let Some(actor) = self.store.identity() {
            let entry = NewActivity::new(actor, action, TargetType::User)
                .target(target_id, target_name)
                .details(details);
            self.record(entry).await;
        }
    }

    async fn record(&self, entry: NewActivity) {
        if let Err(e) = audit::record(&self.db, entry).await {
            tracing::warn!(error = %e, "Failed to record admin activity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_login() {
        let cli = Cli::try_parse_from([
            "beyond2c-admin",
            "login",
            "--email",
            "admin@beyond2c.org",
            "--password",
            "password",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Login {
                email: "admin@beyond2c.org".to_string(),
                password: "password".to_string()
            }
        );
    }

    #[test]
    fn parses_typed_permission_and_role() {
        let cli = Cli::try_parse_from(["beyond2c-admin", "check", "blog.publish"]).unwrap();
        assert_eq!(cli.command, Command::Check { permission: Permission::BlogPublish });

        let cli = Cli::try_parse_from(["beyond2c-admin", "users", "set-role", "u-1", "content_manager"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Users(UsersCommand::SetRole { id: "u-1".to_string(), role: Role::ContentManager })
        );
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(Cli::try_parse_from(["beyond2c-admin", "check", "blog.burn"]).is_err());
        assert!(Cli::try_parse_from(["beyond2c-admin", "roles", "operator"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["beyond2c-admin", "status", "--debug", "-c", "admin.toml"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("admin.toml")));
    }
}
