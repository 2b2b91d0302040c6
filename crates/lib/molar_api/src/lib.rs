//! # molar_api
//!
//! HTTP API library for Molar, the dental clinic backend.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use molar_core::store::{PatientStore, UserStore};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::{ApiConfig, ConfigError};
use crate::handlers::{auth, health, patients, users};
use crate::middleware::rbac::{ALL_STAFF, CLINICIANS, MANAGER_ONLY, authorize};
use crate::services::auth::AuthService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub patients: Arc<dyn PatientStore>,
    pub auth: AuthService,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Wire every service to one backing store.
    pub fn new<S>(config: ApiConfig, store: Arc<S>) -> Result<Self, ConfigError>
    where
        S: UserStore + PatientStore + 'static,
    {
        let codec = config.token_codec()?;
        Ok(Self {
            users: store.clone(),
            patients: store.clone(),
            auth: AuthService::new(store, codec),
            config,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `molar_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    molar_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/api/auth/login", post(auth::login_handler));

    // Protected routes (require auth, then a role allowlist per method)
    let protected = Router::new()
        .route(
            "/api/auth/change-password",
            post(auth::change_password_handler),
        )
        .route(
            "/api/users",
            authorize(MANAGER_ONLY, post(users::create_user_handler))
                .merge(authorize(ALL_STAFF, get(users::list_users_handler))),
        )
        .route(
            "/api/users/me",
            get(users::get_me_handler).put(users::update_me_handler),
        )
        .route(
            "/api/users/{id}",
            authorize(ALL_STAFF, get(users::get_user_handler)).merge(authorize(
                MANAGER_ONLY,
                put(users::update_user_handler).delete(users::delete_user_handler),
            )),
        )
        .route(
            "/api/patients",
            authorize(
                ALL_STAFF,
                post(patients::create_patient_handler).get(patients::list_patients_handler),
            ),
        )
        .route(
            "/api/patients/{id}",
            authorize(
                ALL_STAFF,
                get(patients::get_patient_handler).put(patients::update_patient_handler),
            )
            .merge(authorize(CLINICIANS, delete(patients::delete_patient_handler))),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(health::not_found_handler)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
