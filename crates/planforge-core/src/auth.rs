//! Auth Gateway
//!
//! Magic-link issuance and session resolution. A login request always
//! inserts a fresh session row (no deduplication); the returned link embeds
//! a short-lived signed token that activates the session when verified.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, Result};
use crate::session::{Session, SessionId, SessionStore};
use crate::token::TokenSigner;
use crate::user::{User, UserProfile, UserStore};

/// Result of a login request: the verification link and the session it
/// will activate.
#[derive(Clone, Debug)]
pub struct LoginTicket {
    pub login_url: String,
    pub session_id: SessionId,
}

/// Issues and verifies sign-in links, resolves session cookies to users
pub struct AuthGateway {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    tokens: TokenSigner,
    app_url: String,
}

impl AuthGateway {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        tokens: TokenSigner,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
            app_url: app_url.into(),
        }
    }

    /// Start a magic-link login. Gets or creates the user by email, opens a
    /// 7-day session, and returns a verification URL carrying a 1-hour
    /// signed token.
    ///
    /// The find-then-insert here and the one in the checkout path are
    /// intentionally independent and not atomic with each other.
    pub fn request_login(&self, email: &str, now: DateTime<Utc>) -> Result<LoginTicket> {
        if !email.contains('@') {
            return Err(CoreError::InvalidInput("Invalid email".into()));
        }

        let user = match self.users.find_by_email(email)? {
            Some(user) => user,
            None => self.users.insert(email, None)?,
        };

        let session = Session::new(user.id, now);
        self.sessions.save(&session)?;

        let token = self.tokens.sign(&session.id, email, now)?;
        let login_url = format!("{}/api/auth/verify?token={}", self.app_url, token);

        tracing::info!(user_id = user.id, session_id = %session.id, "Issued sign-in link");

        Ok(LoginTicket {
            login_url,
            session_id: session.id,
        })
    }

    /// Verify a sign-in token and return the session id it activates
    pub fn verify(&self, token: &str) -> Result<SessionId> {
        let claims = self.tokens.verify(token)?;
        Ok(SessionId::from_string(claims.sid))
    }

    /// Delete the session if one was presented. Deleting a session that no
    /// longer exists is not an error.
    pub fn logout(&self, session_id: Option<&SessionId>) -> Result<()> {
        if let Some(id) = session_id {
            self.sessions.delete(id)?;
            tracing::info!(session_id = %id, "Session ended");
        }
        Ok(())
    }

    /// Resolve a session cookie to its user with the expiry check applied.
    /// Missing cookie, unknown session, and expired session all fail the
    /// same way.
    pub fn resolve_user(
        &self,
        session_id: Option<&SessionId>,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let id = session_id.ok_or(CoreError::Unauthenticated)?;
        let session = self
            .sessions
            .find_valid(id, now)?
            .ok_or(CoreError::Unauthenticated)?;
        self.users
            .find_by_id(session.user_id)?
            .ok_or(CoreError::Unauthenticated)
    }

    /// Client-safe projection of the current user
    pub fn current_user(
        &self,
        session_id: Option<&SessionId>,
        now: DateTime<Utc>,
    ) -> Result<UserProfile> {
        let user = self.resolve_user(session_id, now)?;
        Ok(UserProfile::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use crate::user::MemoryUserStore;
    use chrono::Duration;

    fn gateway() -> (AuthGateway, Arc<MemoryUserStore>, Arc<MemorySessionStore>) {
        let users = Arc::new(MemoryUserStore::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let gateway = AuthGateway::new(
            users.clone(),
            sessions.clone(),
            TokenSigner::new("test-secret"),
            "http://localhost:3000",
        );
        (gateway, users, sessions)
    }

    #[test]
    fn test_login_rejects_email_without_at() {
        let (gateway, _, _) = gateway();
        for email in ["", "invalid-email", "a.b.com"] {
            assert!(matches!(
                gateway.request_login(email, Utc::now()),
                Err(CoreError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_login_creates_user_once() {
        let (gateway, users, _) = gateway();
        let now = Utc::now();

        gateway.request_login("a@b.com", now).unwrap();
        gateway.request_login("a@b.com", now).unwrap();

        let user = users.find_by_email("a@b.com").unwrap().unwrap();
        assert_eq!(user.id, 1);
    }

    #[test]
    fn test_every_login_opens_a_fresh_session() {
        let (gateway, _, _) = gateway();
        let now = Utc::now();

        let first = gateway.request_login("a@b.com", now).unwrap();
        let second = gateway.request_login("a@b.com", now).unwrap();
        assert_ne!(first.session_id, second.session_id);
    }

    #[test]
    fn test_login_verify_resolve_roundtrip() {
        let (gateway, _, _) = gateway();
        let now = Utc::now();

        let ticket = gateway.request_login("a@b.com", now).unwrap();
        let token = ticket.login_url.split("token=").nth(1).unwrap();

        let session_id = gateway.verify(token).unwrap();
        assert_eq!(session_id, ticket.session_id);

        let profile = gateway.current_user(Some(&session_id), now).unwrap();
        assert_eq!(profile.email, "a@b.com");
    }

    #[test]
    fn test_expired_session_is_unauthenticated() {
        let (gateway, _, sessions) = gateway();
        let now = Utc::now();

        let ticket = gateway.request_login("a@b.com", now).unwrap();

        // past the 7-day session lifetime
        let later = now + Duration::days(8);
        assert!(matches!(
            gateway.current_user(Some(&ticket.session_id), later),
            Err(CoreError::Unauthenticated)
        ));

        // and the row is still present: expired means absent, not swept
        assert!(sessions.find(&ticket.session_id).unwrap().is_some());
    }

    #[test]
    fn test_logout_is_idempotent_and_kills_the_session() {
        let (gateway, _, _) = gateway();
        let now = Utc::now();

        let ticket = gateway.request_login("a@b.com", now).unwrap();
        gateway.logout(Some(&ticket.session_id)).unwrap();
        gateway.logout(Some(&ticket.session_id)).unwrap();
        gateway.logout(None).unwrap();

        assert!(matches!(
            gateway.current_user(Some(&ticket.session_id), now),
            Err(CoreError::Unauthenticated)
        ));
    }
}
