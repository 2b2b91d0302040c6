//! Staff account handlers.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use molar_core::models::auth::{UserFilter, UserUpdate, UserView};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{CreateUserRequest, UserListQuery, parse_id};
use crate::response::{ApiResponse, MessageResponse};
use crate::services::users;

/// `POST /api/users`
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<ApiResponse<UserView>> {
    let user = users::create_user(state.users.as_ref(), body).await?;
    Ok(ApiResponse::created(user).with_message("User created successfully"))
}

/// `GET /api/users?role=&search=`
pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> AppResult<ApiResponse<Vec<UserView>>> {
    let filter = UserFilter::try_from(query)?;
    let list = users::list_users(state.users.as_ref(), &filter).await?;
    Ok(ApiResponse::ok(list))
}

/// `GET /api/users/me`
pub async fn get_me_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> AppResult<ApiResponse<UserView>> {
    let me = users::get_me(
        state.users.as_ref(),
        state.patients.as_ref(),
        &identity.user_id,
    )
    .await?;
    Ok(ApiResponse::ok(me))
}

/// `PUT /api/users/me`
pub async fn update_me_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
    Json(body): Json<UserUpdate>,
) -> AppResult<ApiResponse<UserView>> {
    let me = users::update_me(state.users.as_ref(), &identity.user_id, body).await?;
    Ok(ApiResponse::ok(me).with_message("Profile updated successfully"))
}

/// `GET /api/users/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserView>> {
    let user = users::get_user(state.users.as_ref(), parse_id(&id)?).await?;
    Ok(ApiResponse::ok(user))
}

/// `PUT /api/users/{id}`
pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UserUpdate>,
) -> AppResult<ApiResponse<UserView>> {
    let user = users::update_user(state.users.as_ref(), parse_id(&id)?, body).await?;
    Ok(ApiResponse::ok(user).with_message("User updated successfully"))
}

/// `DELETE /api/users/{id}`
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let resp = users::delete_user(state.users.as_ref(), parse_id(&id)?).await?;
    let message = resp.message.clone();
    Ok(ApiResponse::ok(resp).with_message(message))
}
