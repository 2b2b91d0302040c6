//! Authentication domain models.
//!
//! These are internal domain models; the HTTP layer exposes [`UserView`]
//! and never the full [`CredentialRecord`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Staff role. Every account carries exactly one.
///
/// Serialized uppercase; parsed case-insensitively from strings and JSON alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Role {
    Manager,
    Doctor,
    Assistant,
}

impl Role {
    /// Every role, highest privilege first.
    pub const ALL: [Role; 3] = [Role::Manager, Role::Doctor, Role::Assistant];

    /// Stored and wire representation (`MANAGER`, `DOCTOR`, `ASSISTANT`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "MANAGER",
            Role::Doctor => "DOCTOR",
            Role::Assistant => "ASSISTANT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MANAGER" => Ok(Role::Manager),
            "DOCTOR" => Ok(Role::Doctor),
            "ASSISTANT" => Ok(Role::Assistant),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Who is making a request. Produced by login or token verification and
/// attached to a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Which lifetime a token was minted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject, the user id (standard JWT `sub` claim).
    pub sub: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub kind: TokenKind,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

impl From<TokenClaims> for IdentityClaims {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// A staff account including its password hash.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Claims to sign into tokens for this account.
    pub fn identity(&self) -> IdentityClaims {
        IdentityClaims {
            user_id: self.id.to_string(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    /// Public view without the password hash.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            role: self.role,
            phone: self.phone.clone(),
            specialization: self.specialization.clone(),
            patient_count: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Whether this account matches a listing filter.
    pub fn matches(&self, filter: &UserFilter) -> bool {
        if filter.role.is_some_and(|role| role != self.role) {
            return false;
        }
        match filter.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let needle = term.to_lowercase();
                [
                    &self.first_name,
                    &self.last_name,
                    &self.email,
                    &self.username,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Sanitized staff account as returned over the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    /// Only filled for doctors viewing their own profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new staff account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub specialization: Option<String>,
}

/// Partial update of a staff profile; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
}

/// Staff listing filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Case-insensitive substring over names, email, and username.
    pub search: Option<String>,
}
