//! Stripe Checkout Integration
//!
//! The billing session factory: builds hosted-checkout sessions with the
//! fixed introductory price and provider-side trial window, and billing
//! portal sessions for existing customers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stripe::{
    BillingPortalSession, CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client,
    CreateBillingPortalSession, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData, CreateCheckoutSessionLineItemsPriceDataProductData,
    CreateCheckoutSessionLineItemsPriceDataRecurring,
    CreateCheckoutSessionLineItemsPriceDataRecurringInterval,
    CreateCheckoutSessionSubscriptionData, CreateCustomer, Currency, Customer, CustomerId,
};

use planforge_core::{User, UserStore};

use crate::error::{PaymentError, Result};

/// Fixed introductory price, in euro cents
pub const TRIAL_PRICE_CENTS: i64 = 290;

/// Recurring billing interval, in days
pub const BILLING_INTERVAL_DAYS: u64 = 28;

/// Provider-side trial window, in hours
pub const TRIAL_HOURS: i64 = 48;

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
    webhook_secret: String,
    app_url: String,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str, webhook_secret: &str, app_url: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret: webhook_secret.to_string(),
            app_url: app_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| PaymentError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;
        let app_url = std::env::var("APP_URL")
            .map_err(|_| PaymentError::Config("APP_URL not set".into()))?;

        Ok(Self::new(&secret_key, &webhook_secret, &app_url))
    }

    /// Get the webhook secret
    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    /// Create a subscription checkout session for the trial offer.
    ///
    /// Gets or creates the user by email (independently of the login path,
    /// same find-then-insert semantics), always creates a fresh Stripe
    /// customer, and persists the customer id. Local subscription state is
    /// not touched here; that happens when the webhook confirms the
    /// checkout.
    pub async fn create_checkout_session(
        &self,
        users: &dyn UserStore,
        email: &str,
        name: Option<&str>,
    ) -> Result<CheckoutRedirect> {
        let user = match users.find_by_email(email)? {
            Some(user) => user,
            None => users.insert(email, name)?,
        };

        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), user.id.to_string());

        let mut customer_params = CreateCustomer::new();
        customer_params.email = Some(email);
        customer_params.name = name;
        customer_params.metadata = Some(metadata.clone());

        let customer = Customer::create(&self.client, customer_params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        users.set_customer_id(user.id, customer.id.as_str())?;

        let success_url = format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", self.app_url);
        let cancel_url = format!("{}/cancel", self.app_url);

        let mut params = CreateCheckoutSession::new();
        params.customer = Some(customer.id.clone());
        params.success_url = Some(&success_url);
        params.cancel_url = Some(&cancel_url);
        params.mode = Some(CheckoutSessionMode::Subscription);
        params.metadata = Some(metadata.clone());
        params.subscription_data = Some(CreateCheckoutSessionSubscriptionData {
            // 48h expressed as whole days, the unit checkout sessions take
            trial_period_days: Some(u32::try_from(TRIAL_HOURS / 24).unwrap_or(2)),
            metadata: Some(metadata),
            ..Default::default()
        });
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::EUR,
                unit_amount: Some(TRIAL_PRICE_CENTS),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: "Planforge Trial - 48h".to_string(),
                    description: Some(format!(
                        "Full access for {TRIAL_HOURS}h, then \u{20ac}2.90 every {BILLING_INTERVAL_DAYS} days"
                    )),
                    ..Default::default()
                }),
                recurring: Some(CreateCheckoutSessionLineItemsPriceDataRecurring {
                    interval: CreateCheckoutSessionLineItemsPriceDataRecurringInterval::Day,
                    interval_count: Some(BILLING_INTERVAL_DAYS),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]);

        let session = StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;

        tracing::info!(
            user_id = user.id,
            customer_id = %customer.id,
            "Created checkout session"
        );

        Ok(CheckoutRedirect {
            session_id: session.id.to_string(),
            url,
        })
    }

    /// Create a billing-portal session scoped to the user's customer
    pub async fn create_portal_session(&self, user: &User) -> Result<String> {
        let customer_id = user
            .stripe_customer_id
            .as_deref()
            .ok_or(PaymentError::NoBillingCustomer)?;
        let customer_id: CustomerId = customer_id
            .parse()
            .map_err(|_| PaymentError::Stripe("Malformed customer id".into()))?;

        let return_url = format!("{}/app/settings", self.app_url);
        let mut params = CreateBillingPortalSession::new(customer_id);
        params.return_url = Some(&return_url);

        let portal = BillingPortalSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        Ok(portal.url)
    }

    /// Get the underlying Stripe client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Result of creating a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRedirect {
    /// Stripe session id
    pub session_id: String,

    /// URL of the hosted checkout page
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_pricing_constants() {
        assert_eq!(TRIAL_PRICE_CENTS, 290);
        assert_eq!(BILLING_INTERVAL_DAYS, 28);
        assert_eq!(TRIAL_HOURS, 48);
    }

    #[test]
    fn test_app_url_is_normalized() {
        let client = StripeClient::new("sk_test_x", "whsec_x", "http://localhost:3000/");
        assert_eq!(client.app_url, "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_portal_requires_a_customer() {
        let client = StripeClient::new("sk_test_x", "whsec_x", "http://localhost:3000");
        let user = planforge_core::User::new(1, "a@b.com", None, Utc::now());

        let result = client.create_portal_session(&user).await;
        assert!(matches!(result, Err(PaymentError::NoBillingCustomer)));
    }
}
