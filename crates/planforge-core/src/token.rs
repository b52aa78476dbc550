//! Magic-Link Tokens
//!
//! Signed, time-boxed sign-in tokens embedding a session id and email.
//! Verification is deliberately uniform: a forged signature, an expired
//! token, and a malformed token all fail with the same error, so the
//! response leaks nothing about which check tripped.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::session::SessionId;

/// Claims carried by a sign-in token
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginClaims {
    /// Session id the link activates
    pub sid: String,

    /// Email the link was issued for
    pub email: String,

    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// HS256 signer/verifier for sign-in tokens
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenSigner {
    /// Token lifetime: 1 hour
    pub const LIFETIME_SECS: i64 = 3600;

    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::seconds(Self::LIFETIME_SECS),
        }
    }

    /// Sign a token for a session, expiring `LIFETIME_SECS` after `now`
    pub fn sign(&self, session_id: &SessionId, email: &str, now: DateTime<Utc>) -> Result<String> {
        let claims = LoginClaims {
            sid: session_id.as_str().to_string(),
            email: email.to_string(),
            exp: (now + self.lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CoreError::Other(e.to_string()))
    }

    /// Verify signature and expiry. Every failure mode maps to
    /// `CoreError::InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<LoginClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<LoginClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| CoreError::InvalidToken)
    }
}
