//! The admin session: who is logged in, restored from storage at startup.
//!
//! ```text
//!            restore() ok                login() ok
//!  Loading ───────────────► Authenticated ◄──────────── Unauthenticated
//!     │                          │                            ▲
//!     │ restore() missing/corrupt│ logout()                   │
//!     └──────────────────────────┴────────────────────────────┘
//! ```
//!
//! The store is an ordinary value: build one per context and pass it
//! around. Transitions take `&mut self`.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::jwt::SessionTokens;
use crate::auth::rbac;
use crate::auth::service::{AuthenticationService, Credential};
use crate::auth::{Identity, Permission};
use crate::error::{AppError, AppResult};

pub mod storage;

pub use storage::{MemoryStorage, SessionStorage, SqliteStorage};

pub const TOKEN_KEY: &str = "admin_token";
pub const USER_KEY: &str = "admin_user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Unauthenticated,
    Authenticated(Identity),
}

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    authenticator: Arc<dyn AuthenticationService>,
    tokens: SessionTokens,
    state: SessionState,
}

impl SessionStore {
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        authenticator: Arc<dyn AuthenticationService>,
        tokens: SessionTokens,
    ) -> Self {
        Self {
            storage,
            authenticator,
            tokens,
            state: SessionState::Loading,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        rbac::has_permission(self.identity(), permission)
    }

    /// Restores a previously persisted session.
    ///
    /// Anything short of a parseable user record with a valid token for the
    /// same user is purged from storage.
    pub async fn restore(&mut self) -> AppResult<&SessionState> {
        let token = self.storage.get_item(TOKEN_KEY).await?;
        let record = self.storage.get_item(USER_KEY).await?;

        let restored = match (token, record) {
            (Some(token), Some(record)) => self.decode(&token, &record),
            (None, None) => None,
            _ => {
                warn!("Incomplete persisted session; discarding");
                None
            }
        };

        match restored {
            Some(identity) => {
                info!(user_id = %identity.id, role = %identity.role, "Session restored");
                self.state = SessionState::Authenticated(identity);
            }
            None => {
                self.clear_persisted().await?;
                self.state = SessionState::Unauthenticated;
            }
        }
        Ok(&self.state)
    }

    fn decode(&self, token: &str, record: &str) -> Option<Identity> {
        let identity: Identity = match serde_json::from_str(record) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Failed to parse persisted admin user");
                return None;
            }
        };

        match self.tokens.verify(token) {
            Ok(claims) if claims.sub == identity.id => Some(identity),
            Ok(claims) => {
                warn!(token_sub = %claims.sub, user_id = %identity.id, "Session token belongs to another user");
                None
            }
            Err(e) => {
                warn!(error = %e, "Session token rejected");
                None
            }
        }
    }

    /// Attempts a login. `Ok(false)` means the credential was rejected and
    /// nothing changed.
    pub async fn login(&mut self, email: &str, password: &str) -> AppResult<bool> {
        let credential = Credential::new(email, password);
        let Some(mut identity) = self.authenticator.verify(&credential).await? else {
            info!(email = %email, "Login rejected");
            return Ok(false);
        };

        identity.last_login = Utc::now();
        let token = self
            .tokens
            .issue(&identity)
            .map_err(|e| AppError::Internal(format!("Failed to issue session token: {}", e)))?;
        let record = serde_json::to_string(&identity)?;

        self.storage.set_item(TOKEN_KEY, &token).await?;
        if let Err(e) = self.storage.set_item(USER_KEY, &record).await {
            warn!(error = %e, "Failed to persist admin user; discarding token");
            if let Err(cleanup) = self.storage.remove_item(TOKEN_KEY).await {
                warn!(error = %cleanup, "Failed to discard session token");
            }
            return Err(e);
        }

        info!(user_id = %identity.id, role = %identity.role, "Login succeeded");
        self.state = SessionState::Authenticated(identity);
        Ok(true)
    }

    /// Ends the session. Safe to call when nobody is logged in.
    pub async fn logout(&mut self) -> AppResult<()> {
        self.clear_persisted().await?;
        if let SessionState::Authenticated(identity) = &self.state {
            info!(user_id = %identity.id, "Logged out");
        }
        self.state = SessionState::Unauthenticated;
        Ok(())
    }

    async fn clear_persisted(&self) -> AppResult<()> {
        debug!("Clearing persisted session");
        self.storage.remove_item(TOKEN_KEY).await?;
        self.storage.remove_item(USER_KEY).await?;
        Ok(())
    }
}
