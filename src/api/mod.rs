use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::{Config, SessionStoreKind};
use crate::services::{AccountService, AuthService, GigService};
use crate::state::SharedState;

mod accounts;
pub mod auth;
pub mod context;
mod error;
pub mod flash;
mod gigs;
mod home;
mod observability;
mod types;
pub mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn gig_service(&self) -> &Arc<dyn GigService> {
        &self.shared.gig_service
    }

    #[must_use]
    pub fn account_service(&self) -> &Arc<dyn AccountService> {
        &self.shared.account_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let config = state.shared.config().await;

    let api_router = match config.server.session_store {
        SessionStoreKind::Memory => api_routes(state.clone(), MemoryStore::default(), &config),
        SessionStoreKind::Sqlite => {
            let pool = state.store().conn.get_sqlite_connection_pool().clone();
            let store = SqliteStore::new(pool);
            store.migrate().await?;
            api_routes(state.clone(), store, &config)
        }
    };

    let cors_origins = &config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
    };

    Ok(Router::new()
        .nest("/api", api_router)
        .layer(
            cors_layer
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request()),
        )
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http()))
}

fn api_routes<S: SessionStore + Clone>(
    state: Arc<AppState>,
    session_store: S,
    config: &Config,
) -> Router {
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.server.secure_cookies)
        .with_http_only(true)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.server.session_inactivity_minutes,
        )));

    Router::new()
        .route("/home", get(home::home))
        .route("/flashes", get(flash::drain))
        .merge(auth_routes())
        .merge(gig_routes())
        .route(
            "/users/me",
            put(accounts::update_account).delete(accounts::delete_account),
        )
        .route("/users/{username}", get(accounts::get_profile))
        .route("/health", get(observability::health))
        .route("/metrics", get(observability::get_metrics))
        .layer(session_layer)
        .with_state(state)
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::current_user))
        .route("/auth/activate/{token}", get(auth::activate))
        .route("/auth/send-activation", post(auth::send_activation))
        .route("/auth/password-reset", post(auth::request_password_reset))
        .route(
            "/auth/update-password/{token}/{email}",
            get(auth::check_reset_link).post(auth::update_password),
        )
}

fn gig_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/gigs", post(gigs::create_gig))
        .route("/gigs/mine", get(gigs::my_gigs))
        .route(
            "/gigs/{slug}",
            get(gigs::get_gig)
                .put(gigs::update_gig)
                .delete(gigs::delete_gig),
        )
        .route(
            "/gigs/{slug}/apply",
            post(gigs::apply_to_gig).delete(gigs::withdraw_application),
        )
}
