//! Request and response bodies.
//!
//! Field names are camelCase on the wire.

use molar_core::models::auth::{Role, UserFilter, UserView};
use molar_core::models::patient::PatientFilter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// `POST /api/auth/login` body. `username` may also hold an email address.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/change-password` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserView,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// `POST /api/users` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub specialization: Option<String>,
}

impl CreateUserRequest {
    /// Reject blank required fields, listing each offending field.
    pub fn validate(&self) -> AppResult<()> {
        let mut fields = Vec::new();
        for (name, value) in [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                fields.push(json!({ "field": name, "message": "must not be empty" }));
            }
        }
        if !self.email.trim().is_empty() && !self.email.contains('@') {
            fields.push(json!({ "field": "email", "message": "must be an email address" }));
        }
        if fields.is_empty() {
            return Ok(());
        }
        Err(AppError::Validation {
            message: "Validation failed".into(),
            details: Some(json!(fields)),
        })
    }
}

/// `GET /api/users` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub search: Option<String>,
}

impl TryFrom<UserListQuery> for UserFilter {
    type Error = AppError;

    fn try_from(query: UserListQuery) -> AppResult<Self> {
        let role = query
            .role
            .filter(|r| !r.trim().is_empty())
            .map(|r| r.parse::<Role>())
            .transpose()
            .map_err(|e| AppError::validation(e.to_string()))?;
        Ok(UserFilter {
            role,
            search: query.search,
        })
    }
}

/// `GET /api/patients` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientListQuery {
    pub search: Option<String>,
    pub primary_dentist_id: Option<String>,
}

impl TryFrom<PatientListQuery> for PatientFilter {
    type Error = AppError;

    fn try_from(query: PatientListQuery) -> AppResult<Self> {
        let primary_dentist_id = query
            .primary_dentist_id
            .filter(|id| !id.trim().is_empty())
            .map(|id| parse_id(&id))
            .transpose()?;
        Ok(PatientFilter {
            search: query.search,
            primary_dentist_id,
        })
    }
}

/// Parse a resource id from a path or query parameter.
pub fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation(format!("Invalid id: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateUserRequest {
        CreateUserRequest {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "doctor@clinic.com".into(),
            username: "doctor".into(),
            password: "password123".into(),
            role: Role::Doctor,
            phone: None,
            specialization: None,
        }
    }

    #[test]
    fn complete_request_is_valid() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn blank_fields_are_listed() {
        let mut req = create_request();
        req.first_name = " ".into();
        req.password = String::new();
        let Err(AppError::Validation { details, .. }) = req.validate() else {
            panic!("expected validation error");
        };
        let details = details.unwrap();
        assert_eq!(details.as_array().unwrap().len(), 2);
        assert_eq!(details[0]["field"], "firstName");
        assert_eq!(details[1]["field"], "password");
    }

    #[test]
    fn unknown_role_filter_is_rejected() {
        let query = UserListQuery {
            role: Some("JANITOR".into()),
            search: None,
        };
        assert!(UserFilter::try_from(query).is_err());
    }

    #[test]
    fn role_filter_parses() {
        let query = UserListQuery {
            role: Some("doctor".into()),
            search: Some("john".into()),
        };
        let filter = UserFilter::try_from(query).unwrap();
        assert_eq!(filter.role, Some(Role::Doctor));
        assert_eq!(filter.search.as_deref(), Some("john"));
    }

    #[test]
    fn bad_dentist_id_is_rejected() {
        let query = PatientListQuery {
            search: None,
            primary_dentist_id: Some("nope".into()),
        };
        assert!(PatientFilter::try_from(query).is_err());
    }
}
