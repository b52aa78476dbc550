//! Sessions
//!
//! Server-issued bearer credentials: an opaque id mapping to a user and an
//! absolute expiry. Possession of the id implies authentication, so ids are
//! generated from a v4 UUID. Expired sessions are treated as absent by every
//! consumer; rows are only ever deleted on logout (no background sweep, a
//! known resource-growth behavior).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Opaque session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A session row
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier (capability token)
    pub id: SessionId,

    /// Owning user
    pub user_id: i64,

    /// Absolute expiry
    pub expires_at: DateTime<Utc>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Session lifetime: 7 days
    pub const LIFETIME_DAYS: i64 = 7;

    pub fn new(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            expires_at: now + Duration::days(Self::LIFETIME_DAYS),
            created_at: now,
        }
    }

    /// A session is valid iff `now < expires_at`
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Session storage trait
pub trait SessionStore: Send + Sync {
    /// Save a session
    fn save(&self, session: &Session) -> Result<()>;

    /// Load a session by id, regardless of expiry
    fn find(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Delete a session (idempotent)
    fn delete(&self, id: &SessionId) -> Result<()>;

    /// The one consistent lookup: load a session and apply the expiry
    /// check. An expired row is indistinguishable from an absent one.
    fn find_valid(&self, id: &SessionId, now: DateTime<Utc>) -> Result<Option<Session>> {
        Ok(self.find(id)?.filter(|s| s.is_valid(now)))
    }
}

/// In-memory session store (for development/testing)
pub struct MemorySessionStore {
    sessions: std::sync::RwLock<std::collections::HashMap<SessionId, Session>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: std::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn find(&self, id: &SessionId) -> Result<Option<Session>> {
        let sessions = self.sessions.read().unwrap();
        Ok(sessions.get(id).cloned())
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.remove(id);
        Ok(())
    }
}
