//! Application State

use std::sync::Arc;

use planforge_core::{AuthGateway, SessionStore, UserStore};
use planforge_payments::StripeClient;
use planforge_runtime::PlanGenerator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// User records
    pub users: Arc<dyn UserStore>,

    /// Session rows
    pub sessions: Arc<dyn SessionStore>,

    /// Magic-link issuance and session resolution
    pub auth: Arc<AuthGateway>,

    /// Plan generation and retrieval
    pub generator: Arc<PlanGenerator>,

    /// Stripe client (None if not configured - billing routes answer 503)
    pub stripe: Option<Arc<StripeClient>>,
}
