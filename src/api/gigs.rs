use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::context::RequestContext;
use super::validation::GigForm;
use super::{
    ApiError, ApiResponse, AppState, ApplicationDto, GigDetailsDto, GigDto, MessageResponse,
    gig_dtos,
};
use crate::auth::{Activated, GigOwner, Guards, RoleRequired};
use crate::models::Role;

fn owner_guards(state: &AppState, slug: &str) -> Guards {
    Guards::authenticated()
        .with(RoleRequired(Role::Employer))
        .with(GigOwner::new(state.store().clone(), slug))
        .with(Activated)
}

fn musician_guards() -> Guards {
    Guards::authenticated()
        .with(RoleRequired(Role::Musician))
        .with(Activated)
}

/// POST /gigs
pub async fn create_gig(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    body: Result<Json<GigForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let employer = ctx
        .authorize(
            Guards::authenticated()
                .with(RoleRequired(Role::Employer))
                .with(Activated),
        )
        .await?;

    let Json(form) = body?;
    let input = form.validate()?;
    let gig = state.gig_service().create(&employer, input).await?;

    ctx.flash(format!("The new gig has been added. \"{}\"", gig.title))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(GigDto::from(&gig))),
    ))
}

/// GET /gigs/mine
pub async fn my_gigs(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<GigDto>>>, ApiError> {
    let user = ctx.authorize(Guards::member()).await?;

    let gigs = state.gig_service().gigs_for(&user).await?;
    Ok(Json(ApiResponse::success(gig_dtos(&gigs))))
}

/// GET /gigs/{slug}
pub async fn get_gig(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<GigDetailsDto>>, ApiError> {
    let user = ctx.authorize(Guards::authenticated()).await?;

    let details = state.gig_service().details(&slug).await?;

    let applied = if user.is_role(Role::Musician) {
        Some(details.applicants.iter().any(|a| a.id == user.id))
    } else {
        None
    };

    Ok(Json(ApiResponse::success(GigDetailsDto::new(
        &details, applied,
    ))))
}

/// PUT /gigs/{slug}
pub async fn update_gig(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(slug): Path<String>,
    body: Result<Json<GigForm>, JsonRejection>,
) -> Result<Json<ApiResponse<GigDto>>, ApiError> {
    ctx.authorize(owner_guards(&state, &slug)).await?;

    let Json(form) = body?;
    let input = form.validate()?;
    let gig = state.gig_service().update(&slug, input).await?;

    ctx.flash("The gig is updated.").await?;

    Ok(Json(ApiResponse::success(GigDto::from(&gig))))
}

/// DELETE /gigs/{slug}
pub async fn delete_gig(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    ctx.authorize(owner_guards(&state, &slug)).await?;

    state.gig_service().delete(&slug).await?;

    let message = "The gig was deleted";
    ctx.flash(message).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}

/// POST /gigs/{slug}/apply
pub async fn apply_to_gig(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ApplicationDto>>, ApiError> {
    let musician = ctx.authorize(musician_guards()).await?;

    let gig = state.gig_service().apply(&musician, &slug).await?;

    ctx.flash(format!("You just applied to the gig: \"{}\".", gig.title))
        .await?;

    Ok(Json(ApiResponse::success(ApplicationDto {
        gig: GigDto::from(&gig),
        applied: true,
    })))
}

/// DELETE /gigs/{slug}/apply
pub async fn withdraw_application(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ApplicationDto>>, ApiError> {
    let musician = ctx.authorize(musician_guards()).await?;

    let service = state.gig_service();
    let gig = service.withdraw(&musician, &slug).await?;
    let applied = service.is_applied(&musician, &gig).await?;

    ctx.flash(format!(
        "You withdrew your application to the gig: \"{}\".",
        gig.title
    ))
    .await?;

    Ok(Json(ApiResponse::success(ApplicationDto {
        gig: GigDto::from(&gig),
        applied,
    })))
}
