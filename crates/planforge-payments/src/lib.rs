//! # planforge-payments
//!
//! Stripe integration for planforge: the hosted-checkout session factory,
//! the self-service billing portal, and the webhook reconciler that applies
//! Stripe's asynchronous event stream to local subscription state.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Your Site  │────▶│  Stripe Hosted  │────▶│  Your Site  │
//! │ (checkout)  │     │  Checkout Page  │     │  (success)  │
//! └─────────────┘     └─────────────────┘     └──────┬──────┘
//!                                                    │ webhooks
//!                                             ┌──────▼──────┐
//!                                             │  Reconciler │
//!                                             │ (user state)│
//!                                             └─────────────┘
//! ```
//!
//! Checkout never transitions local state; the user's subscription fields
//! stay untouched until the signed `checkout.session.completed` event
//! arrives. The webhook signature is the sole trust boundary for inbound
//! billing state changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use planforge_payments::{StripeClient, WebhookReconciler};
//!
//! let stripe = StripeClient::from_env()?;
//! let redirect = stripe
//!     .create_checkout_session(users.as_ref(), "user@example.com", None)
//!     .await?;
//! // Redirect user to: redirect.url
//! ```

mod checkout;
mod error;
mod webhook;

pub use checkout::{CheckoutRedirect, StripeClient, BILLING_INTERVAL_DAYS, TRIAL_HOURS, TRIAL_PRICE_CENTS};
pub use error::{PaymentError, Result};
pub use webhook::{WebhookEvent, WebhookReconciler};
