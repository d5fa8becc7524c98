use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub token_secret: String,
    #[serde(default = "default_session_expiry")]
    pub session_expiry_hours: u64,
    #[serde(default)]
    pub backend: AuthBackend,
}

/// Which credential check answers `login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthBackend {
    /// The `admin_users` table.
    #[default]
    Directory,
    /// The single built-in demo account.
    Demo,
}

fn default_db_path() -> String { "./beyond2c-admin.db".to_string() }
fn default_session_expiry() -> u64 { 24 }

const DEFAULT_TOKEN_SECRET: &str = "change-me-in-production";
const MIN_SECRET_LEN: usize = 32;
pub const MAX_SESSION_EXPIRY_HOURS: u64 = 24 * 365;

pub fn validate(cfg: &Config) -> Result<()> {
    if cfg.auth.token_secret == DEFAULT_TOKEN_SECRET {
        anyhow::bail!(
            "SECURITY ERROR: token secret must be changed from default value '{}'. \
            Set BEYOND2C__AUTH__TOKEN_SECRET environment variable with a strong random value.",
            DEFAULT_TOKEN_SECRET
        );
    }

    if cfg.auth.token_secret.len() < MIN_SECRET_LEN {
        anyhow::bail!(
            "CONFIG ERROR: token secret must be at least {} characters (current: {})",
            MIN_SECRET_LEN,
            cfg.auth.token_secret.len()
        );
    }

    if cfg.auth.session_expiry_hours == 0 {
        anyhow::bail!("CONFIG ERROR: session_expiry_hours must be greater than zero");
    }

    if cfg.auth.session_expiry_hours > MAX_SESSION_EXPIRY_HOURS {
        anyhow::bail!(
            "CONFIG ERROR: session_expiry_hours must be at most {} (current: {})",
            MAX_SESSION_EXPIRY_HOURS,
            cfg.auth.session_expiry_hours
        );
    }

    if cfg.database.path != crate::db::MEMORY_PATH {
        if let Some(parent) = Path::new(&cfg.database.path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                anyhow::bail!(
                    "CONFIG ERROR: Database directory does not exist: {}",
                    parent.display()
                );
            }
        }
    }

    tracing::debug!("Configuration validation passed");
    Ok(())
}

/// Loads `config.{toml,yaml,json}` (or `file` when given) and `BEYOND2C__*`
/// environment overrides, then validates.
pub fn load(file: Option<&Path>) -> Result<Config> {
    let source = match file {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config").required(false),
    };

    let cfg = config::Config::builder()
        .add_source(source)
        .add_source(config::Environment::with_prefix("BEYOND2C").separator("__"))
        .set_default("database.path", default_db_path())?
        .set_default("auth.token_secret", DEFAULT_TOKEN_SECRET)?
        .set_default("auth.session_expiry_hours", default_session_expiry())?
        .set_default("auth.backend", "directory")?
        .build()?
        .try_deserialize()?;

    validate(&cfg)?;

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cfg(secret: &str, path: &str) -> Config {
        Config {
            database: DatabaseConfig { path: path.to_string() },
            auth: AuthConfig {
                token_secret: secret.to_string(),
                session_expiry_hours: 24,
                backend: AuthBackend::Directory,
            },
        }
    }

    const GOOD_SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn default_secret_is_rejected() {
        let err = validate(&cfg(DEFAULT_TOKEN_SECRET, ":memory:")).unwrap_err();
        assert!(err.to_string().contains("SECURITY ERROR"));
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = validate(&cfg("too-short", ":memory:")).unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn missing_database_directory_is_rejected() {
        assert!(validate(&cfg(GOOD_SECRET, "/definitely/not/here/admin.db")).is_err());
        assert!(validate(&cfg(GOOD_SECRET, "admin.db")).is_ok());
        assert!(validate(&cfg(GOOD_SECRET, ":memory:")).is_ok());
    }

    #[test]
    fn zero_expiry_is_rejected() {
        let mut c = cfg(GOOD_SECRET, ":memory:");
        c.auth.session_expiry_hours = 0;
        assert!(validate(&c).is_err());
    }

    #[test]
    fn oversized_expiry_is_rejected() {
        let mut c = cfg(GOOD_SECRET, ":memory:");
        c.auth.session_expiry_hours = MAX_SESSION_EXPIRY_HOURS;
        assert!(validate(&c).is_ok());
        c.auth.session_expiry_hours = u64::MAX;
        let err = validate(&c).unwrap_err();
        assert!(err.to_string().contains("at most"));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[database]\npath = \":memory:\"\n\n[auth]\ntoken_secret = \"{}\"\nbackend = \"demo\"\nsession_expiry_hours = 2",
            GOOD_SECRET
        )
        .unwrap();

        let loaded = load(Some(&path)).unwrap();
        assert_eq!(loaded.database.path, ":memory:");
        assert_eq!(loaded.auth.backend, AuthBackend::Demo);
        assert_eq!(loaded.auth.session_expiry_hours, 2);
    }
}
