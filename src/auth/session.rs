//! Session payload stored through `tower-sessions`, and the settings of the
//! signed session cookie.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::{Duration, OffsetDateTime};
use tower_sessions::cookie::Key;
use tower_sessions::MemoryStore;

pub const SESSION_COOKIE: &str = "pantry_sid";

/// Key under which the logged-in staff member is kept in the session.
pub const SESSION_USER_KEY: &str = "staff";

/// Who logged in, as read from the staff record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub is_authenticated: bool,
    pub user_id: String,
    pub username: String,
    pub role: String,
    /// Unix seconds.
    pub created_at: i64,
}

impl SessionUser {
    pub fn new(principal: Principal) -> Self {
        SessionUser {
            is_authenticated: true,
            user_id: principal.user_id,
            username: principal.username,
            role: principal.role,
            created_at: OffsetDateTime::now_utc().unix_timestamp(),
        }
    }
}

/// Everything the session layer needs: the process-wide store, the signing
/// key derived from `SESSION_SECRET`, and the idle lifetime.
#[derive(Clone)]
pub struct SessionSettings {
    store: MemoryStore,
    key: Key,
    idle_ttl: Duration,
    secure: bool,
}

impl SessionSettings {
    pub fn new(secret: &[u8], idle_ttl: Duration) -> Result<Self, ConfigError> {
        let digest = Sha512::digest(secret);
        let key = Key::try_from(digest.as_slice()).map_err(|_| ConfigError::Invalid {
            name: "SESSION_SECRET",
            value: "unusable signing key".into(),
        })?;
        Ok(SessionSettings {
            store: MemoryStore::default(),
            key,
            idle_ttl,
            secure: false,
        })
    }

    /// Mark the cookie `Secure` (HTTPS-only deployments).
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }

    pub fn key(&self) -> Key {
        self.key.clone()
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub fn secure(&self) -> bool {
        self.secure
    }
}
