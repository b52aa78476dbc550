//! Stripe Webhook Handling
//!
//! Verifies provider-signed events and applies idempotent transitions to
//! the user's subscription state. No event is processed without a valid
//! signature. Unrecognized event types and lookup misses are acknowledged
//! and ignored, so the provider does not retry spuriously.

use std::sync::Arc;

use chrono::{Duration, Utc};
use stripe::{Event, EventObject, EventType, Webhook};

use planforge_core::{SubscriptionStatus, UserStore};

use crate::checkout::TRIAL_HOURS;
use crate::error::{PaymentError, Result};

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq)]
pub enum WebhookEvent {
    /// Checkout completed - start the trial
    CheckoutCompleted {
        /// User id from the session metadata; absent metadata means the
        /// event is ignored
        user_id: Option<i64>,
        subscription_id: String,
    },

    /// First real invoice settled - subscription is live
    InvoicePaid { subscription_id: Option<String> },

    /// Payment failed - flag the account
    PaymentFailed { subscription_id: Option<String> },

    /// Subscription cancelled
    SubscriptionDeleted { subscription_id: String },

    /// Unhandled event type
    Other { event_type: String },
}

/// Applies the provider's event stream to local subscription state
pub struct WebhookReconciler {
    users: Arc<dyn UserStore>,
}

impl WebhookReconciler {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Verify webhook signature and parse event
    pub fn parse_event(&self, payload: &str, signature: &str, secret: &str) -> Result<Event> {
        Webhook::construct_event(payload, signature, secret)
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))
    }

    /// Process a verified webhook event
    pub async fn handle(&self, event: Event) -> Result<WebhookEvent> {
        tracing::info!(event_type = ?event.type_, "Processing Stripe webhook");

        let parsed = Self::parse_webhook_event(&event)?;
        self.apply(&parsed)?;
        Ok(parsed)
    }

    /// Apply one state transition. Every arm is safe to apply twice; a
    /// lookup miss is not an error since the event may be unrelated or
    /// arrive out of order.
    pub fn apply(&self, event: &WebhookEvent) -> Result<()> {
        match event {
            WebhookEvent::CheckoutCompleted {
                user_id: Some(user_id),
                subscription_id,
            } => {
                let trial_end = Utc::now() + Duration::hours(TRIAL_HOURS);
                self.users.set_subscription(
                    *user_id,
                    SubscriptionStatus::Trialing,
                    Some(subscription_id),
                    Some(trial_end),
                )?;

                tracing::info!(
                    user_id,
                    subscription_id = %subscription_id,
                    "Trial started"
                );
            }

            WebhookEvent::CheckoutCompleted { user_id: None, .. } => {
                tracing::warn!("Checkout completed without user metadata; ignoring");
            }

            WebhookEvent::InvoicePaid {
                subscription_id: Some(subscription_id),
            } => {
                if let Some(user) = self.users.find_by_subscription(subscription_id)? {
                    self.users.set_status(user.id, SubscriptionStatus::Active)?;
                    tracing::info!(user_id = user.id, "Subscription active");
                }
            }

            WebhookEvent::PaymentFailed {
                subscription_id: Some(subscription_id),
            } => {
                if let Some(user) = self.users.find_by_subscription(subscription_id)? {
                    self.users.set_status(user.id, SubscriptionStatus::PastDue)?;
                    tracing::warn!(user_id = user.id, "Payment failed");
                }
            }

            WebhookEvent::SubscriptionDeleted { subscription_id } => {
                if let Some(user) = self.users.find_by_subscription(subscription_id)? {
                    self.users.set_status(user.id, SubscriptionStatus::Canceled)?;
                    tracing::info!(user_id = user.id, "Subscription canceled");
                }
            }

            WebhookEvent::InvoicePaid { subscription_id: None }
            | WebhookEvent::PaymentFailed { subscription_id: None } => {}

            WebhookEvent::Other { event_type } => {
                tracing::debug!(event_type = %event_type, "Unhandled webhook event");
            }
        }

        Ok(())
    }

    /// Parse Stripe event into our event type
    fn parse_webhook_event(event: &Event) -> Result<WebhookEvent> {
        match event.type_ {
            EventType::CheckoutSessionCompleted => {
                if let EventObject::CheckoutSession(session) = &event.data.object {
                    let user_id = session
                        .metadata
                        .as_ref()
                        .and_then(|m| m.get("user_id"))
                        .and_then(|id| id.parse::<i64>().ok());

                    Ok(WebhookEvent::CheckoutCompleted {
                        user_id,
                        subscription_id: session
                            .subscription
                            .as_ref()
                            .map(|s| s.id().to_string())
                            .unwrap_or_default(),
                    })
                } else {
                    Err(PaymentError::WebhookParse(
                        "Invalid checkout session data".into(),
                    ))
                }
            }

            EventType::InvoicePaid => {
                if let EventObject::Invoice(invoice) = &event.data.object {
                    Ok(WebhookEvent::InvoicePaid {
                        subscription_id: invoice
                            .subscription
                            .as_ref()
                            .map(|s| s.id().to_string()),
                    })
                } else {
                    Err(PaymentError::WebhookParse("Invalid invoice data".into()))
                }
            }

            EventType::InvoicePaymentFailed => {
                if let EventObject::Invoice(invoice) = &event.data.object {
                    Ok(WebhookEvent::PaymentFailed {
                        subscription_id: invoice
                            .subscription
                            .as_ref()
                            .map(|s| s.id().to_string()),
                    })
                } else {
                    Err(PaymentError::WebhookParse("Invalid invoice data".into()))
                }
            }

            EventType::CustomerSubscriptionDeleted => {
                if let EventObject::Subscription(sub) = &event.data.object {
                    Ok(WebhookEvent::SubscriptionDeleted {
                        subscription_id: sub.id.to_string(),
                    })
                } else {
                    Err(PaymentError::WebhookParse("Invalid subscription data".into()))
                }
            }

            _ => Ok(WebhookEvent::Other {
                event_type: format!("{:?}", event.type_),
            }),
        }
    }
}
