//! Persistence seams.
//!
//! Services take these traits as injected `Arc<dyn ...>` handles so tests can
//! run against [`memory::MemoryStore`] while the server uses
//! [`postgres::PgStore`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{CredentialRecord, NewUser, UserFilter, UserUpdate};
use crate::models::patient::{NewPatient, Patient, PatientFilter, PatientUpdate};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A foreign key named a row that does not exist.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A stored row could not be mapped back to a domain value.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Lookup and password replacement for staff credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an account whose username or email equals `identifier`.
    /// When both fields match different accounts, the username match wins.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CredentialRecord>>;

    /// Replace the stored hash. Returns `false` when no such account exists.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool>;
}

/// Staff account management.
#[async_trait]
pub trait UserStore: CredentialStore {
    async fn create_user(&self, user: NewUser) -> Result<CredentialRecord>;

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<CredentialRecord>>;

    /// Apply a partial update. Returns `None` when no such account exists.
    async fn update_user(&self, id: Uuid, update: &UserUpdate)
    -> Result<Option<CredentialRecord>>;

    /// Returns `false` when no such account exists.
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    /// Whether any account already uses this email or username.
    async fn identifier_taken(&self, email: &str, username: &str) -> Result<bool>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Patient record management.
#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn create_patient(&self, patient: NewPatient) -> Result<Patient>;

    /// Matching patients, newest first.
    async fn list_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>>;

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>>;

    /// Apply a partial update. Returns `None` when no such patient exists.
    async fn update_patient(&self, id: Uuid, update: &PatientUpdate) -> Result<Option<Patient>>;

    /// Returns `false` when no such patient exists.
    async fn delete_patient(&self, id: Uuid) -> Result<bool>;

    /// Number of patients whose primary dentist is `dentist_id`.
    async fn count_for_dentist(&self, dentist_id: Uuid) -> Result<i64>;
}
