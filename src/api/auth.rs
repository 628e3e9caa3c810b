use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::context::{RequestContext, with_cookies};
use super::validation::{LoginForm, PasswordResetForm, RegisterForm, UpdatePasswordForm};
use super::{ApiError, ApiResponse, AppState, CurrentUserDto, MessageResponse, UserDto};
use crate::auth::Guards;

#[derive(Serialize)]
pub struct ResetLinkResponse {
    pub username: String,
    pub message: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    body: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(form) = body?;
    let registration = form.validate()?;

    let user = state.auth_service().register(registration).await?;

    ctx.log_in(user.id).await?;
    ctx.flash("You are registered").await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::private(&user))),
    ))
}

/// POST /auth/login
/// Rate limiting is not applied here.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    body: Result<Json<LoginForm>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(form) = body?;
    form.validate()?;

    let outcome = state
        .auth_service()
        .login(&form.email, &form.password, form.remember_me)
        .await?;

    ctx.log_in(outcome.user.id).await?;
    ctx.flash("You are successfully logged in").await?;

    let body = Json(ApiResponse::success(UserDto::private(&outcome.user)));

    Ok(match outcome.remember_secret {
        Some(secret) => with_cookies(
            body,
            state.shared.signer.remember_cookies(outcome.user.id, &secret),
        ),
        None => body.into_response(),
    })
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    let user = ctx.authorize(Guards::authenticated()).await?;

    state.auth_service().forget(user.id).await?;
    ctx.log_out().await?;
    ctx.flash("You are logged out").await?;

    tracing::info!(user_id = user.id, "User logged out");

    Ok(with_cookies(
        Json(ApiResponse::success(MessageResponse::new("You are logged out"))),
        state.shared.signer.forget_cookies(),
    ))
}

/// GET /auth/me
pub async fn current_user(ctx: RequestContext) -> Json<ApiResponse<CurrentUserDto>> {
    Json(ApiResponse::success(CurrentUserDto {
        authenticated: ctx.principal.is_authenticated(),
        user: ctx.principal.user().map(UserDto::private),
    }))
}

/// GET /auth/activate/{token}
pub async fn activate(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = ctx.authorize(Guards::authenticated()).await?;

    let user = match state.auth_service().activate(&user, &token).await {
        Ok(user) => user,
        Err(e) => return Err(ctx.reject(e.into()).await),
    };

    ctx.flash(format!(
        "Your account is confirmed. Welcome {} to the page",
        user.username
    ))
    .await?;

    Ok(Json(ApiResponse::success(UserDto::private(&user))))
}

/// POST /auth/send-activation
pub async fn send_activation(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = ctx.authorize(Guards::authenticated()).await?;

    state.auth_service().send_activation(&user).await?;

    let message = "New email has been sent. Please confirm your account";
    ctx.flash(message).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}

/// POST /auth/password-reset
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    body: Result<Json<PasswordResetForm>, JsonRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    ctx.require_anonymous()?;

    let Json(form) = body?;
    form.validate()?;

    state
        .auth_service()
        .request_password_reset(&form.email)
        .await?;

    let message = "The password reset instructions are sent to your email";
    ctx.flash(message).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}

/// GET /auth/update-password/{token}/{email}
pub async fn check_reset_link(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path((token, email)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ResetLinkResponse>>, ApiError> {
    ctx.require_anonymous()?;

    let user = match state.auth_service().check_reset_link(&token, &email).await {
        Ok(user) => user,
        Err(e) => return Err(ctx.reject(e.into()).await),
    };

    Ok(Json(ApiResponse::success(ResetLinkResponse {
        message: format!(
            "Hi {}! You can now set a new password for the account",
            user.username
        ),
        username: user.username,
    })))
}

/// POST /auth/update-password/{token}/{email}
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path((token, email)): Path<(String, String)>,
    body: Result<Json<UpdatePasswordForm>, JsonRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    ctx.require_anonymous()?;

    // An invalid link is reported before any form errors.
    if let Err(e) = state.auth_service().check_reset_link(&token, &email).await {
        return Err(ctx.reject(e.into()).await);
    }

    let Json(form) = body?;
    form.validate()?;

    if let Err(e) = state
        .auth_service()
        .reset_password(&token, &email, &form.password)
        .await
    {
        return Err(ctx.reject(e.into()).await);
    }

    let message = "New password is set! You can now login to your account";
    ctx.flash(message).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}
