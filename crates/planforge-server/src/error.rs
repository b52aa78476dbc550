//! HTTP Error Mapping
//!
//! Collapses the core and payment error taxonomies into JSON error
//! responses. Only the `user_message` leaves the process; provider error
//! bodies and internal detail stay in the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use planforge_core::CoreError;
use planforge_payments::PaymentError;

/// JSON error body: `{"error": "<message>"}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An error ready to become an HTTP response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Billing routes when Stripe is not configured
    pub fn payments_disabled() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "Payments not configured")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::InvalidInput(_) | CoreError::InvalidToken => StatusCode::BAD_REQUEST,
            CoreError::Unauthenticated | CoreError::InvalidSession => StatusCode::UNAUTHORIZED,
            CoreError::SubscriptionRequired => StatusCode::FORBIDDEN,
            CoreError::NotFound => StatusCode::NOT_FOUND,
            _ => {
                tracing::error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self::new(status, err.user_message())
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        let status = match &err {
            PaymentError::MissingSignature
            | PaymentError::WebhookSignature(_)
            | PaymentError::WebhookParse(_)
            | PaymentError::NoBillingCustomer => StatusCode::BAD_REQUEST,
            PaymentError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => {
                tracing::error!(error = %err, "Payment provider error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self::new(status, err.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_status_mapping() {
        let cases = [
            (CoreError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::InvalidToken, StatusCode::BAD_REQUEST),
            (CoreError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (CoreError::InvalidSession, StatusCode::UNAUTHORIZED),
            (CoreError::SubscriptionRequired, StatusCode::FORBIDDEN),
            (CoreError::NotFound, StatusCode::NOT_FOUND),
            (CoreError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_payment_error_status_mapping() {
        assert_eq!(
            ApiError::from(PaymentError::MissingSignature).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PaymentError::NoBillingCustomer).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PaymentError::Stripe("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
