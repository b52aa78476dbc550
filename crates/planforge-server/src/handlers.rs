//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planforge_core::{
    BusinessPlan, CoreError, PlanContent, PlanSummary, SessionId, UserProfile,
};
use planforge_payments::{CheckoutRedirect, PaymentError, WebhookReconciler};
use planforge_runtime::PlanForm;

use crate::error::ApiError;
use crate::extract::{SESSION_COOKIE, SessionCookie, Subscriber};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub login_url: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub plan_id: i64,
    pub content: PlanContent,
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<PlanSummary>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: BusinessPlan,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlanRequest {
    pub content: PlanContent,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

// ============================================================================
// Cookie plumbing
// ============================================================================

/// Session cookie attributes: whole site, 7 days, lax same-site
fn session_cookie_header(session_id: &SessionId) -> Result<HeaderValue, ApiError> {
    HeaderValue::try_from(format!(
        "{SESSION_COOKIE}={session_id}; HttpOnly; Path=/; Max-Age=604800; SameSite=Lax"
    ))
    .map_err(|_| ApiError::from(CoreError::InvalidToken))
}

fn clear_cookie_header() -> HeaderValue {
    HeaderValue::from_static("session=; HttpOnly; Path=/; Max-Age=0")
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

/// Magic-link login: returns the verification URL directly (an email
/// delivery would go here in production)
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let ticket = state.auth.request_login(&payload.email, Utc::now())?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Sign-in link generated",
        login_url: ticket.login_url,
        session_id: ticket.session_id.to_string(),
    }))
}

/// Verify a magic link: set the session cookie and redirect into the app
pub async fn verify_login(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .ok_or_else(|| ApiError::from(CoreError::InvalidInput("Missing token".into())))?;

    let session_id = state.auth.verify(&token)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::LOCATION, HeaderValue::from_static("/app"));
    headers.insert(header::SET_COOKIE, session_cookie_header(&session_id)?);

    Ok((StatusCode::FOUND, headers).into_response())
}

/// Logout: delete the session if one was presented, always clear the
/// cookie and redirect home
pub async fn logout(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Response {
    if let Err(e) = state.auth.logout(session_id.as_ref()) {
        tracing::warn!(error = %e, "Logout failed to delete session");
    }

    let mut headers = HeaderMap::new();
    headers.insert(header::LOCATION, HeaderValue::from_static("/"));
    headers.insert(header::SET_COOKIE, clear_cookie_header());

    (StatusCode::FOUND, headers).into_response()
}

/// Current user, or `{"user": null}` with 401
pub async fn current_user(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Response {
    match state.auth.current_user(session_id.as_ref(), Utc::now()) {
        Ok(profile) => Json(MeResponse {
            user: Some(profile),
        })
        .into_response(),
        Err(CoreError::Unauthenticated | CoreError::InvalidSession) => {
            (StatusCode::UNAUTHORIZED, Json(MeResponse { user: None })).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Generate a business plan from a form submission
pub async fn generate_plan(
    State(state): State<AppState>,
    Subscriber(user): Subscriber,
    Json(form): Json<PlanForm>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let generated = state.generator.generate(&user, &form).await?;

    Ok(Json(GenerateResponse {
        success: true,
        plan_id: generated.plan_id,
        content: generated.content,
    }))
}

/// The caller's plans, most recent first
pub async fn list_plans(
    State(state): State<AppState>,
    Subscriber(user): Subscriber,
) -> Result<Json<PlansResponse>, ApiError> {
    let plans = state.generator.list(&user)?;
    Ok(Json(PlansResponse { plans }))
}

/// A single plan with content
pub async fn get_plan(
    State(state): State<AppState>,
    Subscriber(user): Subscriber,
    Path(id): Path<i64>,
) -> Result<Json<PlanResponse>, ApiError> {
    let plan = state.generator.get(&user, id)?;
    Ok(Json(PlanResponse { plan }))
}

/// Replace a plan's content
pub async fn update_plan(
    State(state): State<AppState>,
    Subscriber(user): Subscriber,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePlanRequest>,
) -> Result<Json<UpdateResponse>, ApiError> {
    state.generator.update(&user, id, payload.content)?;
    Ok(Json(UpdateResponse { success: true }))
}

/// Create a Stripe checkout session for the trial offer
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutRedirect>, ApiError> {
    let stripe = state.stripe.as_ref().ok_or_else(ApiError::payments_disabled)?;

    let redirect = stripe
        .create_checkout_session(
            state.users.as_ref(),
            &payload.email,
            payload.name.as_deref(),
        )
        .await?;

    Ok(Json(redirect))
}

/// Open the self-service billing portal for the current user
pub async fn create_portal(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Result<Json<PortalResponse>, ApiError> {
    let stripe = state.stripe.as_ref().ok_or_else(ApiError::payments_disabled)?;

    let user = state.auth.resolve_user(session_id.as_ref(), Utc::now())?;
    let url = stripe.create_portal_session(&user).await?;

    Ok(Json(PortalResponse { url }))
}

/// Stripe webhook: verify the signature, reconcile subscription state,
/// and always acknowledge verified events
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>, ApiError> {
    let stripe = state.stripe.as_ref().ok_or_else(ApiError::payments_disabled)?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(PaymentError::MissingSignature)?;

    let reconciler = WebhookReconciler::new(state.users.clone());

    let event = reconciler
        .parse_event(&body, signature, stripe.webhook_secret())
        .map_err(|e| {
            tracing::warn!(error = %e, "Webhook signature failed");
            e
        })?;

    reconciler.handle(event).await?;

    Ok(Json(WebhookAck { received: true }))
}
