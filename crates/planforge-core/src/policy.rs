//! Access Policy
//!
//! The subscription gate in front of the authenticated API surface,
//! expressed as a pure function of the stores, the presented session id,
//! and the clock. No side effects; handlers run it before touching any
//! per-user data.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, Result};
use crate::session::{SessionId, SessionStore};
use crate::user::{User, UserStore};

/// Access eligibility: an active or trialing subscription, or an unexpired
/// trial window.
pub fn has_access(user: &User, now: DateTime<Utc>) -> bool {
    user.subscription_status.grants_access()
        || user.trial_end_date.is_some_and(|end| end > now)
}

/// Resolve and gate a request.
///
/// 1. no session id presented        -> `Unauthenticated`
/// 2. session unknown or expired     -> `InvalidSession`
/// 3. no paid or trial access        -> `SubscriptionRequired`
pub fn authorize(
    users: &dyn UserStore,
    sessions: &dyn SessionStore,
    session_id: Option<&SessionId>,
    now: DateTime<Utc>,
) -> Result<User> {
    let id = session_id.ok_or(CoreError::Unauthenticated)?;

    let session = sessions
        .find_valid(id, now)?
        .ok_or(CoreError::InvalidSession)?;

    let user = users
        .find_by_id(session.user_id)?
        .ok_or(CoreError::InvalidSession)?;

    if !has_access(&user, now) {
        return Err(CoreError::SubscriptionRequired);
    }

    Ok(user)
}
