//! Per-request session gate.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use bookworm_db::{PublicUser, StoreError, UserId, UserStore};
use bookworm_http::error::AppError;
use thiserror::Error;

use crate::token::{TokenError, TokenService};

pub const UNAUTHORIZED_ACCESS: &str = "Unauthorized access";
pub const TOKEN_NOT_VALID: &str = "Token is not valid";

const BEARER_PREFIX: &str = "Bearer ";

/// Why a request was turned away. Every variant becomes a 401; only the
/// message differs.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("no bearer credential supplied")]
    MissingCredentials,

    #[error("authorization header is not a bearer credential")]
    MalformedHeader,

    #[error(transparent)]
    InvalidToken(#[from] TokenError),

    #[error("token subject {0} does not exist")]
    UnknownSubject(UserId),

    /// Infrastructure failure. Reported to clients as an invalid token.
    #[error("credential store failed: {0}")]
    Store(#[from] StoreError),
}

impl From<GuardError> for AppError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::MissingCredentials | GuardError::UnknownSubject(_) => {
                AppError::unauthorized(UNAUTHORIZED_ACCESS)
            }
            GuardError::MalformedHeader | GuardError::InvalidToken(_) | GuardError::Store(_) => {
                AppError::unauthorized(TOKEN_NOT_VALID)
            }
        }
    }
}

/// Verifies bearer tokens and resolves their subject.
#[derive(Clone)]
pub struct SessionGuard {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
}

impl SessionGuard {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    /// Extract, verify, and resolve the caller identified by `headers`.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<PublicUser, GuardError> {
        let token = bearer_token(headers)?;
        let user_id = self.tokens.verify(token)?;

        self.users
            .find_public_by_id(&user_id)
            .await?
            .ok_or(GuardError::UnknownSubject(user_id))
    }
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GuardError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or(GuardError::MissingCredentials)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(GuardError::MalformedHeader)?
        .trim();

    if token.is_empty() {
        return Err(GuardError::MissingCredentials);
    }

    Ok(token)
}

/// The authenticated caller, resolved before the handler runs.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    SessionGuard: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let guard = SessionGuard::from_ref(state);

        match guard.authenticate(&parts.headers).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "session resolved");
                Ok(CurrentUser(user))
            }
            Err(GuardError::Store(err)) => {
                tracing::error!(error = %err, "session guard could not reach the credential store");
                Err(GuardError::Store(err).into())
            }
            Err(err) => {
                tracing::warn!(reason = %err, "session rejected");
                Err(err.into())
            }
        }
    }
}
