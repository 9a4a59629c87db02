use axum::{
    Json, Router,
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    routing::post,
};
use tracing::{error, info};
use validator::Validate;

use crate::{
    errors::{Error, Result},
    middleware::{SessionToken, require_actor},
    state::AppState,
    store::StoreError,
    utils::validated_form::ValidatedJson,
};

pub fn router(state: AppState) -> Router<AppState> {
    let unprotected = |state: AppState| -> Router<AppState> {
        Router::new()
            .route("/register", post(register))
            .route("/signin", post(sign_in))
            .route("/password/reset-request", post(request_password_reset))
            .with_state(state)
    };
    let protected = |state: AppState| -> Router<AppState> {
        Router::new()
            .route("/signout", post(sign_out))
            .layer(middleware::from_fn_with_state(state.clone(), require_actor))
            .with_state(state)
    };
    Router::new()
        .merge(unprotected(state.clone()))
        .merge(protected(state.clone()))
        .with_state(state)
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "Display name must be at least 3 characters."))]
    pub display_name: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub password: String,
}

/// Registration is invitation-gated: no pending invitation, no account.
/// The invitation decides role, display name and parent; the form only
/// carries credentials.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    state
        .invitations
        .find_by_email(&input.email)
        .await?
        .ok_or(Error::NotInvited)?;

    if state.accounts.find_by_email(&input.email).await?.is_some() {
        return Err(Error::EmailExists);
    }

    let user = state
        .identity
        .create_user(&input.email, &input.password)
        .await?;

    // The consume is the race arbiter: if another registration got here
    // first, the invitation is gone and this one is rejected.
    let account = state
        .invitations
        .consume(&input.email, &user.id)
        .await
        .map_err(|err| match err {
            StoreError::NoInvitation(_) => Error::NotInvited,
            other => Error::Store(other),
        })?;

    info!(
        "account created for {} with role {:?}",
        account.email, account.role
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            msg: format!("user with email: {} created", input.email),
        }),
    ))
}

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SignInResponse {
    pub token: String,
}

pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<SignInRequest>,
) -> Result<Json<SignInResponse>> {
    let session = state
        .identity
        .sign_in(&input.email, &input.password)
        .await?;

    // Fire and forget; a missing record during the registration window is
    // not an error.
    state.sessions.touch_last_login(&session.user.id).await;

    Ok(Json(SignInResponse {
        token: session.token,
    }))
}

pub async fn sign_out(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<StatusCode> {
    state.identity.sign_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
}

/// Always the same success message, registered email or not.
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>> {
    if let Err(err) = state.identity.send_password_reset(&input.email).await {
        error!("password reset dispatch failed: {err}");
    }

    Ok(Json(MessageResponse {
        msg: format!(
            "If an account exists for {}, a password reset link has been sent.",
            input.email
        ),
    }))
}
