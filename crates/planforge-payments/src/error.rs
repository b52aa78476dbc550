//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Webhook signature header absent
    #[error("Missing webhook signature")]
    MissingSignature,

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// The user has no provider customer yet (nothing to open a portal for)
    #[error("No billing customer")]
    NoBillingCustomer,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::Stripe(_) => "Payment processing failed. Please try again.",
            PaymentError::MissingSignature => "Missing signature.",
            PaymentError::WebhookSignature(_) => "Invalid signature.",
            PaymentError::NoBillingCustomer => "No billing customer.",
            PaymentError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}

impl From<planforge_core::CoreError> for PaymentError {
    fn from(err: planforge_core::CoreError) -> Self {
        PaymentError::Storage(err.to_string())
    }
}
