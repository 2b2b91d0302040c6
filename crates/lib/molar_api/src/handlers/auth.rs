//! Authentication request handlers.

use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ChangePasswordRequest, LoginRequest, LoginResponse};
use crate::response::{ApiResponse, MessageResponse};

/// `POST /api/auth/login`: authenticate with username or email plus password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let resp = state.auth.login(&body.username, &body.password).await?;
    Ok(ApiResponse::ok(resp).with_message("Login successful"))
}

/// `POST /api/auth/change-password`: requires authentication.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let resp = state
        .auth
        .change_password(&identity.user_id, &body.old_password, &body.new_password)
        .await?;
    let message = resp.message.clone();
    Ok(ApiResponse::ok(resp).with_message(message))
}
