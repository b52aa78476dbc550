//! planforge HTTP Server
//!
//! Axum router and handlers over the core services. The library exposes
//! the router so integration tests can drive the full surface without a
//! socket.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    create_checkout, create_portal, current_user, generate_plan, get_plan, health_check,
    list_plans, login, logout, stripe_webhook, update_plan, verify_login,
};
use crate::state::AppState;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))
        // Auth
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", get(verify_login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(current_user))
        // Plans (subscription-gated)
        .route("/api/generate", post(generate_plan))
        .route("/api/plans", get(list_plans))
        .route("/api/plans/{id}", get(get_plan).put(update_plan))
        // Billing
        .route("/api/stripe/checkout", post(create_checkout))
        .route("/api/stripe/portal", post(create_portal))
        .route("/api/stripe/webhook", post(stripe_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
