//! One-shot notices stored in the session and drained by the client.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::context::RequestContext;
use super::{ApiError, ApiResponse, AppState};
use crate::constants::session::FLASHES_KEY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

pub async fn push(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
) -> Result<(), ApiError> {
    let mut flashes: Vec<Flash> = session
        .get(FLASHES_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .unwrap_or_default();

    flashes.push(Flash {
        level,
        message: message.into(),
    });

    session
        .insert(FLASHES_KEY, flashes)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

pub async fn take(session: &Session) -> Result<Vec<Flash>, ApiError> {
    let flashes = session
        .remove::<Vec<Flash>>(FLASHES_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    Ok(flashes.unwrap_or_default())
}

/// GET /flashes
pub async fn drain(
    State(_state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<Flash>>>, ApiError> {
    Ok(Json(ApiResponse::success(take(&ctx.session).await?)))
}
