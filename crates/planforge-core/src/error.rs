//! Error Types

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error taxonomy
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed request body or fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No session cookie presented, or it resolves to nothing
    #[error("Not authenticated")]
    Unauthenticated,

    /// Session not found or expired
    #[error("Invalid session")]
    InvalidSession,

    /// Valid session but no paid or trial access
    #[error("Subscription required")]
    SubscriptionRequired,

    /// Resource absent, or not owned by the caller (never distinguished)
    #[error("Not found")]
    NotFound,

    /// Sign-in token failed verification. Forged, expired, and malformed
    /// tokens all land here: a single uniform error.
    #[error("Invalid or expired link")]
    InvalidToken,

    /// Text-generation provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Convert to a user-facing message (no internal detail)
    pub fn user_message(&self) -> String {
        match self {
            CoreError::InvalidInput(msg) => msg.clone(),
            CoreError::Unauthenticated => "Not authenticated".into(),
            CoreError::InvalidSession => "Invalid session".into(),
            CoreError::SubscriptionRequired => "Subscription required".into(),
            CoreError::NotFound => "Not found".into(),
            CoreError::InvalidToken => "Invalid or expired link".into(),
            CoreError::Provider(_) | CoreError::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Other(err.to_string())
    }
}
