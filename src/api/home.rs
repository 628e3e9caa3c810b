use axum::{Json, extract::State};
use std::sync::Arc;

use super::context::RequestContext;
use super::{ApiError, ApiResponse, AppState, HomeDto};

/// GET /home
/// Musicians see every gig, employers see every musician.
pub async fn home(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<HomeDto>>, ApiError> {
    let feed = state.account_service().home_feed(&ctx.principal).await?;
    Ok(Json(ApiResponse::success(HomeDto::from(&feed))))
}
