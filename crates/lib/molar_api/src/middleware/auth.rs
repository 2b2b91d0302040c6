//! Authentication middleware: Bearer token extraction and JWT verification.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use molar_core::auth::jwt::TokenCodec;
use molar_core::models::auth::{IdentityClaims, Role};
use tracing::{debug, warn};

use crate::AppState;
use crate::config::Environment;
use crate::error::AppError;

/// Identity attached to request extensions once a request is authenticated.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub IdentityClaims);

/// The fixed identity used by the development bypass.
pub fn development_identity() -> IdentityClaims {
    IdentityClaims {
        user_id: "dev-manager-id".into(),
        username: "dev-manager".into(),
        email: "dev@example.com".into(),
        role: Role::Manager,
    }
}

/// The token from an `Authorization: Bearer <token>` header, if well formed.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the identity for a request.
///
/// `environment` comes from server configuration only. The bypass branch is
/// taken solely when it is `Development` and no bearer token was sent.
pub fn resolve_identity(
    environment: Environment,
    codec: &TokenCodec,
    headers: &HeaderMap,
) -> Result<IdentityClaims, AppError> {
    let token = bearer_token(headers);

    if token.is_none() && environment.allows_identity_bypass() {
        warn!("no bearer token, running request as the development manager identity");
        return Ok(development_identity());
    }

    let token = token.ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;

    codec.verify_access(token).map_err(|e| {
        debug!(error = %e, "token verification failed");
        AppError::Unauthorized("Invalid or expired token".into())
    })
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the JWT,
/// and injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = resolve_identity(
        state.config.environment,
        state.auth.codec(),
        request.headers(),
    )?;

    request.extensions_mut().insert(AuthenticatedUser(identity));

    Ok(next.run(request).await)
}
