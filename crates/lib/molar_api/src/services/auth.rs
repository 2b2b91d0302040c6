//! Authentication service: login and password change over an injected
//! credential store.

use std::sync::Arc;

use molar_core::auth::AuthError;
use molar_core::auth::jwt::TokenCodec;
use molar_core::auth::password::{hash_password, verify_password};
use molar_core::store::CredentialStore;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::LoginResponse;
use crate::response::MessageResponse;

/// Login and password change, holding its collaborators explicitly.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, codec: TokenCodec) -> Self {
        Self { store, codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authenticate with username-or-email + password.
    ///
    /// An unknown identifier and a wrong password fail identically.
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<LoginResponse> {
        let Some(record) = self.store.find_by_identifier(identifier).await? else {
            return Err(AuthError::CredentialError.into());
        };

        if !verify_password(password, &record.password_hash)? {
            return Err(AuthError::CredentialError.into());
        }

        let identity = record.identity();
        let access_token = self.codec.sign_access(&identity)?;
        let refresh_token = self.codec.sign_refresh(&identity)?;

        info!(user_id = %record.id, role = %record.role, "login succeeded");

        Ok(LoginResponse {
            user: record.view(),
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.codec.access_ttl_secs(),
        })
    }

    /// Replace the caller's password after re-verifying the current one.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<MessageResponse> {
        let user_not_found = || AppError::Unauthorized("User not found".into());

        let id = Uuid::parse_str(user_id).map_err(|_| user_not_found())?;
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(user_not_found)?;

        if !verify_password(old_password, &record.password_hash)? {
            return Err(AppError::BadRequest("Current password is incorrect".into()));
        }

        let new_hash = hash_password(new_password)?;
        if !self.store.update_password_hash(id, &new_hash).await? {
            return Err(user_not_found());
        }

        info!(user_id = %id, "password changed");
        Ok(MessageResponse::new("Password changed successfully"))
    }
}
