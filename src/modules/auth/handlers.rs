use anyhow::Context;
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use bookworm_db::{NewUser, StoreError};
use bookworm_http::error::AppError;

use super::models::{AuthResponse, LoginRequest, RegisterRequest};
use super::AuthState;
use crate::utils::{avatar_url, present};

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters long";
pub const USERNAME_TOO_SHORT: &str = "Username must be at least 3 characters long";
pub const EMAIL_EXISTS: &str = "Email already exists";
pub const USERNAME_EXISTS: &str = "Username already exists";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

const MIN_PASSWORD_CHARS: usize = 6;
const MIN_USERNAME_CHARS: usize = 3;

/// POST /register
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(request) = payload?;

    let (Some(email), Some(username), Some(password)) = (
        present(request.email),
        present(request.username),
        present(request.password),
    ) else {
        return Err(AppError::bad_request(ALL_FIELDS_REQUIRED));
    };

    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::bad_request(PASSWORD_TOO_SHORT));
    }
    if username.chars().count() < MIN_USERNAME_CHARS {
        return Err(AppError::bad_request(USERNAME_TOO_SHORT));
    }

    if state
        .users
        .find_by_email(&email)
        .await
        .context("failed to look up email")?
        .is_some()
    {
        return Err(AppError::bad_request(EMAIL_EXISTS));
    }
    if state
        .users
        .find_by_username(&username)
        .await
        .context("failed to look up username")?
        .is_some()
    {
        return Err(AppError::bad_request(USERNAME_EXISTS));
    }

    let profile_image = avatar_url(&username);
    let created = state
        .users
        .create(NewUser {
            email,
            username,
            password,
            profile_image,
        })
        .await;

    // The store re-checks uniqueness, so a concurrent registration can still collide here.
    let user = match created {
        Ok(user) => user,
        Err(StoreError::Duplicate { field: "email" }) => {
            return Err(AppError::bad_request(EMAIL_EXISTS))
        }
        Err(StoreError::Duplicate { .. }) => return Err(AppError::bad_request(USERNAME_EXISTS)),
        Err(err) => return Err(anyhow::Error::new(err).context("failed to save user").into()),
    };

    let token = state
        .tokens
        .issue(&user.id)
        .context("failed to issue session token")?;

    tracing::info!(module = "auth", user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.public(),
        }),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(request) = payload?;

    let (Some(email), Some(password)) = (present(request.email), present(request.password))
    else {
        return Err(AppError::bad_request(ALL_FIELDS_REQUIRED));
    };

    let user = state
        .users
        .find_by_email(&email)
        .await
        .context("failed to look up user")?;

    let verified = match &user {
        Some(user) => user.verify_password(&password).await,
        None => false,
    };

    // Unknown email and wrong password must be indistinguishable.
    let Some(user) = user.filter(|_| verified) else {
        tracing::warn!(module = "auth", "login rejected");
        return Err(AppError::bad_request(INVALID_CREDENTIALS));
    };

    let token = state
        .tokens
        .issue(&user.id)
        .context("failed to issue session token")?;

    tracing::info!(module = "auth", user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        token,
        user: user.public(),
    }))
}
