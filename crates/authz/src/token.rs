//! Signed, time-limited session tokens.

use std::fmt;

use bookworm_db::UserId;
use bookworm_kernel::settings::AuthSettings;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing secret is not configured")]
    MissingSecret,

    #[error("token lifetime must be a positive number of days, got {0}")]
    InvalidLifetime(i64),

    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("token rejected: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("token subject is not a user id")]
    InvalidSubject,
}

/// Issues and verifies HS256 session tokens. Nothing is stored server-side;
/// a token stays valid until it expires.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: TimeDelta) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    /// Build from configuration. A missing secret is a startup error.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, TokenError> {
        let secret = settings
            .jwt_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or(TokenError::MissingSecret)?;

        let ttl = Some(settings.token_ttl_days)
            .filter(|days| *days > 0)
            .and_then(TimeDelta::try_days)
            .ok_or(TokenError::InvalidLifetime(settings.token_ttl_days))?;

        Ok(Self::new(secret.as_bytes(), ttl))
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Sign a token for `user_id` expiring one lifetime from now.
    pub fn issue(&self, user_id: &UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    fn issue_at(&self, user_id: &UserId, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Check signature and expiry and return the embedded user id.
    /// Does not check that the user still exists.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let data =
            decode::<Claims>(token, &self.decoding, &self.validation).map_err(TokenError::Invalid)?;

        data.claims
            .user_id
            .parse()
            .map_err(|_| TokenError::InvalidSubject)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.validation.algorithms)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
