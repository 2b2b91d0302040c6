//! Role allowlist gating.
//!
//! Allowlists are fixed when routes are registered; the check itself is a
//! pure function of the request identity and that list.

use axum::extract::{Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use axum::routing::MethodRouter;
use molar_core::models::auth::{IdentityClaims, Role};
use tracing::debug;

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;

/// Every staff role.
pub const ALL_STAFF: &[Role] = &[Role::Manager, Role::Doctor, Role::Assistant];
pub const MANAGER_ONLY: &[Role] = &[Role::Manager];
pub const CLINICIANS: &[Role] = &[Role::Manager, Role::Doctor];

/// Pass when `identity` holds one of `allowed`.
pub fn check_roles(identity: Option<&IdentityClaims>, allowed: &[Role]) -> Result<(), AppError> {
    let identity =
        identity.ok_or_else(|| AppError::Forbidden("Authentication required".into()))?;

    if allowed.contains(&identity.role) {
        return Ok(());
    }

    let required = allowed
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    debug!(user = %identity.username, role = %identity.role, %required, "role check failed");
    Err(AppError::Forbidden(format!(
        "Access denied. Required roles: {required}"
    )))
}

/// Allowlist carried as middleware state.
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [Role]);

/// Axum middleware: rejects requests whose identity is not in the allowlist.
/// Must run after [`require_auth`](crate::middleware::auth::require_auth).
pub async fn require_roles(
    State(AllowedRoles(allowed)): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| &user.0);
    check_roles(identity, allowed)?;
    Ok(next.run(request).await)
}

/// Gate a method router behind a role allowlist.
pub fn authorize<S>(allowed: &'static [Role], route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(from_fn_with_state(AllowedRoles(allowed), require_roles))
}
