//! Liveness endpoints and the unmatched-route fallback.

use axum::Json;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

use crate::AppState;
use crate::error::{ErrorBody, ErrorResponse};

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    pub timestamp: String,
    pub db_connected: bool,
}

/// `GET /`
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        success: true,
        message: "Dental Clinic API is running".into(),
    })
}

/// `GET /health`: verifies the store is reachable.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_connected = match state.users.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("store health check failed: {e}");
            false
        }
    };

    Json(HealthResponse {
        status: if db_connected { "ok" } else { "degraded" },
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        db_connected,
    })
}

/// Fallback for unmatched routes.
pub async fn not_found_handler(method: Method, uri: Uri) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorBody {
            message: format!("Route {method} {} not found", uri.path()),
            code: "ROUTE_NOT_FOUND".into(),
            details: None,
        },
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
