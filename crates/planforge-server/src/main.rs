//! planforge HTTP Server
//!
//! Axum-based server providing the auth, billing, and plan-generation API.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planforge_core::{
    AuthGateway, GenerationOptions, LlmProvider, MemoryPlanStore, MemorySessionStore,
    MemoryUserStore, PlanStore, SessionStore, TokenSigner, UserStore,
};
use planforge_payments::StripeClient;
use planforge_runtime::{HostedCompletionProvider, PlanGenerator};
use planforge_server::{build_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET not set")?;
    let app_url =
        std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".into());

    // Stores
    let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let plans: Arc<dyn PlanStore> = Arc::new(MemoryPlanStore::new());

    // Auth gateway
    let auth = Arc::new(AuthGateway::new(
        users.clone(),
        sessions.clone(),
        TokenSigner::new(&jwt_secret),
        app_url.clone(),
    ));

    // Text-generation provider
    let mut options = GenerationOptions {
        json_response: true,
        ..Default::default()
    };

    let provider = match HostedCompletionProvider::from_env() {
        Ok(provider) => {
            options.model = provider.model().to_string();

            match provider.health_check().await {
                Ok(true) => tracing::info!("✓ Connected to completion endpoint"),
                Ok(false) | Err(_) => {
                    tracing::warn!("⚠ Completion endpoint not reachable - plans will fall back");
                }
            }

            Some(Arc::new(provider) as Arc<dyn LlmProvider>)
        }
        Err(_) => {
            tracing::warn!("⚠ AI endpoint not configured - generated plans use the template");
            tracing::warn!("  Set AI_API_KEY in .env");
            None
        }
    };

    let generator = Arc::new(PlanGenerator::new(provider, plans, options));

    // Payments
    let stripe = StripeClient::from_env().ok();

    if stripe.is_some() {
        tracing::info!("✓ Stripe configured");
    } else {
        tracing::warn!("⚠ Stripe not configured - billing disabled");
        tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET in .env");
    }

    // Build application state
    let state = AppState {
        users,
        sessions,
        auth,
        generator,
        stripe: stripe.map(Arc::new),
    };

    let app = build_router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 planforge server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health               - Health check");
    tracing::info!("  POST /api/auth/login       - Request a sign-in link");
    tracing::info!("  GET  /api/auth/verify      - Verify a sign-in link");
    tracing::info!("  POST /api/auth/logout      - End the session");
    tracing::info!("  GET  /api/auth/me          - Current user");
    tracing::info!("  POST /api/generate         - Generate a business plan");
    tracing::info!("  GET  /api/plans            - List plans");
    tracing::info!("  GET  /api/plans/{{id}}       - Fetch a plan");
    tracing::info!("  PUT  /api/plans/{{id}}       - Update a plan");
    tracing::info!("  POST /api/stripe/checkout  - Start the trial checkout");
    tracing::info!("  POST /api/stripe/portal    - Open the billing portal");
    tracing::info!("  POST /api/stripe/webhook   - Stripe event sink");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
