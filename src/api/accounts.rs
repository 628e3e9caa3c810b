use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::Response,
};
use std::sync::Arc;

use super::context::{RequestContext, with_cookies};
use super::validation::AccountForm;
use super::{ApiError, ApiResponse, AppState, MessageResponse, ProfileDto, UserDto};
use crate::auth::Guards;

/// GET /users/{username}
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<ProfileDto>>, ApiError> {
    let viewer = ctx.authorize(Guards::member()).await?;

    let profile = state.account_service().profile(&username).await?;
    let own = profile.user.id == viewer.id;

    Ok(Json(ApiResponse::success(ProfileDto::new(&profile, own))))
}

/// PUT /users/me
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    body: Result<Json<AccountForm>, JsonRejection>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = ctx.authorize(Guards::member()).await?;

    let Json(form) = body?;
    form.validate()?;

    let updated = state
        .account_service()
        .update_profile(&user, form.location, form.description)
        .await?;

    ctx.flash("Your account has been updated").await?;

    Ok(Json(ApiResponse::success(UserDto::private(&updated))))
}

/// DELETE /users/me
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    let user = ctx.authorize(Guards::member()).await?;

    state.account_service().delete_account(&user).await?;

    ctx.log_out().await?;
    let message = "Your account has been deleted";
    ctx.flash(message).await?;

    Ok(with_cookies(
        Json(ApiResponse::success(MessageResponse::new(message))),
        state.shared.signer.forget_cookies(),
    ))
}
