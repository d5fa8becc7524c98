//! Credential verification behind a trait, so the session store does not care
//! whether a literal check or the user directory answers.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

use super::identity::Identity;
use super::password;
use super::role::Role;
use crate::error::AppResult;

pub const DEMO_EMAIL: &str = "admin@beyond2c.org";
pub const DEMO_PASSWORD: &str = "password";

#[derive(Clone)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait AuthenticationService: Send + Sync {
    /// Resolves a credential to an identity. `Ok(None)` covers both an
    /// unknown email and a wrong password.
    async fn verify(&self, credential: &Credential) -> AppResult<Option<Identity>>;
}

/// A single fixed account, checked without any backing store.
pub struct StaticCredentialService {
    email: String,
    password_hash: String,
    identity: Identity,
}

impl StaticCredentialService {
    pub fn new(email: &str, password: &str, identity: Identity) -> Result<Self> {
        Ok(Self {
            email: email.to_string(),
            password_hash: password::hash(password)?,
            identity,
        })
    }

    /// The stock `admin@beyond2c.org` / `password` super admin.
    pub fn demo() -> Result<Self> {
        let identity = Identity::new("1", DEMO_EMAIL, Role::SuperAdmin).with_display_name("Admin User");
        Self::new(DEMO_EMAIL, DEMO_PASSWORD, identity)
    }
}

#[async_trait]
impl AuthenticationService for StaticCredentialService {
    async fn verify(&self, credential: &Credential) -> AppResult<Option<Identity>> {
        if credential.email != self.email || !password::verify(&credential.password, &self.password_hash) {
            return Ok(None);
        }
        Ok(Some(self.identity.clone()))
    }
}
