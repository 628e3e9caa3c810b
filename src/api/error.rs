use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::constants::routes;
use crate::models::FieldErrors;
use crate::services::{AccountError, AuthError, GigError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    /// Form input rejected field by field.
    Form(FieldErrors),

    InternalError(String),

    /// Request body that could not be read as the expected JSON. Keeps the
    /// status axum chose (400, 415 or 422).
    Body { status: StatusCode, message: String },

    /// 303 to `location`. The notice, if any, is also queued as a flash
    /// message by [`super::context::RequestContext::reject`].
    Redirect {
        location: String,
        notice: Option<String>,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::Form(errors) => write!(f, "Validation error: {}", errors),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Body { message, .. } => write!(f, "Bad request body: {}", message),
            ApiError::Redirect { location, .. } => write!(f, "Redirect to {}", location),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::<()>::error(msg)),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("A database error occurred"),
                )
            }
            ApiError::Form(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiResponse::field_errors(errors),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("An internal error occurred"),
                )
            }
            ApiError::Body { status, message } => (status, ApiResponse::error(message)),
            ApiError::Redirect { location, notice } => {
                let body = ApiResponse::<()>::redirect(&location, notice);
                return (
                    StatusCode::SEE_OTHER,
                    [(header::LOCATION, location)],
                    Json(body),
                )
                    .into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{err:#}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Form(errors)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Fields(errors) => ApiError::Form(errors),
            AuthError::InvalidActivationLink | AuthError::InvalidResetLink => {
                ApiError::home(Some(err.to_string()))
            }
            AuthError::AlreadyActivated => ApiError::home(None),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<GigError> for ApiError {
    fn from(err: GigError) -> Self {
        match err {
            GigError::NotFound(slug) => ApiError::not_found("Gig", slug),
            GigError::Database(msg) => ApiError::DatabaseError(msg),
            GigError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(username) => ApiError::not_found("User", username),
            AccountError::Database(msg) => ApiError::DatabaseError(msg),
            AccountError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    pub fn redirect(location: impl Into<String>, notice: Option<String>) -> Self {
        ApiError::Redirect {
            location: location.into(),
            notice,
        }
    }

    pub fn home(notice: Option<String>) -> Self {
        Self::redirect(routes::HOME, notice)
    }
}
