//! User Accounts
//!
//! Identity records with their per-user billing state machine. Subscription
//! fields are mutated only by the billing factory (customer id) and the
//! webhook reconciler (status transitions).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::Result;

/// Subscription lifecycle states, as reported by the payment provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    None,
    Trialing,
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "trialing" => SubscriptionStatus::Trialing,
            "active" => SubscriptionStatus::Active,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::None,
        }
    }

    /// Whether this status alone grants access to the paid surface
    pub fn grants_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        SubscriptionStatus::None
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    /// Numeric id, assigned on creation
    pub id: i64,

    /// Unique email (natural key, stored case-sensitive)
    pub email: String,

    /// Optional display name
    pub name: Option<String>,

    /// Payment-provider customer id (set on first checkout)
    pub stripe_customer_id: Option<String>,

    /// Subscription status
    pub subscription_status: SubscriptionStatus,

    /// Opaque provider subscription reference
    pub subscription_id: Option<String>,

    /// Trial window end
    pub trial_end_date: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: i64, email: impl Into<String>, name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            email: email.into(),
            name,
            stripe_customer_id: None,
            subscription_status: SubscriptionStatus::None,
            subscription_id: None,
            trial_end_date: None,
            created_at: now,
        }
    }
}

/// Projection of a user safe to return to the client. Never carries the
/// provider customer id or subscription id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub trial_end_date: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            subscription_status: user.subscription_status,
            trial_end_date: user.trial_end_date,
        }
    }
}

/// User storage trait
pub trait UserStore: Send + Sync {
    /// Insert a new user, assigning its id
    fn insert(&self, email: &str, name: Option<&str>) -> Result<User>;

    /// Get user by id
    fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get user by provider subscription id
    fn find_by_subscription(&self, subscription_id: &str) -> Result<Option<User>>;

    /// Record the provider customer id for a user
    fn set_customer_id(&self, user_id: i64, customer_id: &str) -> Result<()>;

    /// Apply a full subscription transition (status + reference + trial end)
    fn set_subscription(
        &self,
        user_id: i64,
        status: SubscriptionStatus,
        subscription_id: Option<&str>,
        trial_end: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Apply a status-only transition
    fn set_status(&self, user_id: i64, status: SubscriptionStatus) -> Result<()>;
}

/// In-memory user store (for development/testing)
pub struct MemoryUserStore {
    users: RwLock<HashMap<i64, User>>,
    by_email: RwLock<HashMap<String, i64>>,
    next_id: AtomicI64,
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            by_email: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl UserStore for MemoryUserStore {
    fn insert(&self, email: &str, name: Option<&str>) -> Result<User> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User::new(id, email, name.map(str::to_string), Utc::now());

        let mut users = self.users.write().unwrap();
        let mut by_email = self.by_email.write().unwrap();
        by_email.insert(user.email.clone(), id);
        users.insert(id, user.clone());

        Ok(user)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let by_email = self.by_email.read().unwrap();
        let users = self.users.read().unwrap();
        Ok(by_email.get(email).and_then(|id| users.get(id)).cloned())
    }

    fn find_by_subscription(&self, subscription_id: &str) -> Result<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .find(|u| u.subscription_id.as_deref() == Some(subscription_id))
            .cloned())
    }

    fn set_customer_id(&self, user_id: i64, customer_id: &str) -> Result<()> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            user.stripe_customer_id = Some(customer_id.to_string());
        }
        Ok(())
    }

    fn set_subscription(
        &self,
        user_id: i64,
        status: SubscriptionStatus,
        subscription_id: Option<&str>,
        trial_end: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            user.subscription_status = status;
            user.subscription_id = subscription_id.map(str::to_string);
            user.trial_end_date = trial_end;
        }
        Ok(())
    }

    fn set_status(&self, user_id: i64, status: SubscriptionStatus) -> Result<()> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            user.subscription_status = status;
        }
        Ok(())
    }
}
