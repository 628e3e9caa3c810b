use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, header, request::Parts},
    response::{IntoResponse, Response},
};
use cookie::{Cookie, CookieJar};
use std::sync::Arc;
use tower_sessions::Session;

use super::flash::{self, FlashLevel};
use super::{ApiError, AppState};
use crate::auth::{Decision, Guards, Principal, jar_from_headers};
use crate::constants::session::USER_ID_KEY;
use crate::models::User;

/// Per-request view of who is calling, with access to their session.
///
/// The principal is resolved once per request and cached in the request
/// extensions, so several extractors in one handler share the result.
pub struct RequestContext {
    pub principal: Principal,
    pub session: Session,
    pub jar: CookieJar,
}

impl FromRequestParts<Arc<AppState>> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::internal(msg))?;

        let jar = jar_from_headers(&parts.headers);

        let principal = if let Some(principal) = parts.extensions.get::<Principal>() {
            principal.clone()
        } else {
            let principal = state.shared.resolver.resolve(&session, &jar).await?;
            parts.extensions.insert(principal.clone());
            principal
        };

        if let Some(user_id) = principal.id() {
            tracing::Span::current().record("user_id", user_id);
        }

        Ok(Self {
            principal,
            session,
            jar,
        })
    }
}

impl RequestContext {
    /// Runs the guard chain and returns the authenticated user.
    /// A denial queues its notice and becomes a redirect.
    pub async fn authorize(&self, guards: Guards) -> Result<User, ApiError> {
        match guards.check(&self.principal).await? {
            Decision::Allow => {}
            Decision::Deny(rejection) => {
                tracing::debug!(
                    target_path = rejection.target.path(),
                    notice = %rejection.notice,
                    "Request denied by guard"
                );
                return Err(self
                    .reject(ApiError::redirect(
                        rejection.target.path(),
                        Some(rejection.notice),
                    ))
                    .await);
            }
        }

        self.principal
            .user()
            .cloned()
            .ok_or_else(|| ApiError::internal("Guard chain passed without a user"))
    }

    /// Turns away callers that are already logged in.
    pub fn require_anonymous(&self) -> Result<(), ApiError> {
        if self.principal.is_authenticated() {
            return Err(ApiError::home(None));
        }
        Ok(())
    }

    /// Queues the notice of a redirect error as a flash message.
    pub async fn reject(&self, err: ApiError) -> ApiError {
        if let ApiError::Redirect {
            notice: Some(notice),
            ..
        } = &err
            && let Err(e) = flash::push(&self.session, FlashLevel::Danger, notice.clone()).await
        {
            return e;
        }
        err
    }

    pub async fn flash(&self, message: impl Into<String>) -> Result<(), ApiError> {
        flash::push(&self.session, FlashLevel::Success, message).await
    }

    /// Binds the session to `user_id` under a fresh session id.
    pub async fn log_in(&self, user_id: i32) -> Result<(), ApiError> {
        self.session
            .cycle_id()
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;
        self.session
            .insert(USER_ID_KEY, user_id)
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))
    }

    pub async fn log_out(&self) -> Result<(), ApiError> {
        self.session
            .remove::<i32>(USER_ID_KEY)
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;
        Ok(())
    }
}

/// Appends a `Set-Cookie` header for each cookie.
pub fn with_cookies<const N: usize>(response: impl IntoResponse, cookies: [Cookie<'static>; N]) -> Response {
    let mut response = response.into_response();

    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(cookie = cookie.name(), "Unencodable cookie: {e}"),
        }
    }

    response
}
