//! Request Extractors
//!
//! The session cookie reader and the access-control gate. The gate is the
//! explicit composition the handlers opt into: cookie -> session -> user ->
//! subscription policy, evaluated against the stores and the clock with no
//! side effects.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use planforge_core::{SessionId, User, policy};

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Read the session id from a request's cookies, if present
pub fn session_from_parts(parts: &Parts) -> Option<SessionId> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(SESSION_COOKIE)
        .map(|cookie| SessionId::from_string(cookie.value()))
}

/// Optional session cookie. Never rejects; handlers decide what absence
/// means.
pub struct SessionCookie(pub Option<SessionId>);

impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_from_parts(parts)))
    }
}

/// A resolved, subscription-gated user. Routes taking this extractor are
/// behind the access-control middleware: a request only reaches the
/// handler once the policy has passed, with the user attached.
pub struct Subscriber(pub User);

impl FromRequestParts<AppState> for Subscriber {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_id = session_from_parts(parts);

        let user = policy::authorize(
            state.users.as_ref(),
            state.sessions.as_ref(),
            session_id.as_ref(),
            Utc::now(),
        )?;

        Ok(Self(user))
    }
}
