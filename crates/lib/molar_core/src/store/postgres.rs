//! PostgreSQL-backed stores.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, PatientStore, Result, StoreError, UserStore};
use crate::models::auth::{CredentialRecord, NewUser, UserFilter, UserUpdate};
use crate::models::patient::{NewPatient, Patient, PatientFilter, PatientUpdate};

const USER_COLUMNS: &str = "id, first_name, last_name, email, username, password_hash, role, \
                            phone, specialization, created_at, updated_at";

const PATIENT_COLUMNS: &str = "id, first_name, last_name, date_of_birth, phone, email, \
                               primary_dentist_id, registered_by_id, created_at, updated_at";

/// Stores backed by a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    username: String,
    password_hash: String,
    role: String,
    phone: Option<String>,
    specialization: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for CredentialRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = row
            .role
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("user {}: {e}", row.id)))?;
        Ok(Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            role,
            phone: row.phone,
            specialization: row.specialization,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PatientRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    date_of_birth: Option<NaiveDate>,
    phone: Option<String>,
    email: Option<String>,
    primary_dentist_id: Option<Uuid>,
    registered_by_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PatientRow> for Patient {
    fn from(row: PatientRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: row.date_of_birth,
            phone: row.phone,
            email: row.email,
            primary_dentist_id: row.primary_dentist_id,
            registered_by_id: row.registered_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Map constraint violations caused by the written values to their store errors.
fn map_write_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::InvalidReference(db.message().to_string())
        }
        _ => StoreError::DbError(e),
    }
}

/// Wrap a search term for `ILIKE`, escaping its wildcards.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn search_term(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern)
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE username = $1 OR email = $1 \
             ORDER BY (username = $1) DESC, created_at ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?
            .map(CredentialRecord::try_from)
            .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CredentialRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(CredentialRecord::try_from)
            .transpose()
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<CredentialRecord> {
        let sql = format!(
            "INSERT INTO users (id, first_name, last_name, email, username, password_hash, \
                                role, phone, specialization) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&user.phone)
            .bind(&user.specialization)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.try_into()
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<CredentialRecord>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::text IS NULL OR role = $1) \
               AND ($2::text IS NULL \
                    OR first_name ILIKE $2 OR last_name ILIKE $2 \
                    OR email ILIKE $2 OR username ILIKE $2) \
             ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(filter.role.map(|r| r.as_str()))
            .bind(search_term(filter.search.as_deref()))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(CredentialRecord::try_from).collect()
    }

    async fn update_user(
        &self,
        id: Uuid,
        update: &UserUpdate,
    ) -> Result<Option<CredentialRecord>> {
        let sql = format!(
            "UPDATE users SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                phone = COALESCE($5, phone), \
                specialization = COALESCE($6, specialization), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(&update.email)
            .bind(&update.phone)
            .bind(&update.specialization)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .map(CredentialRecord::try_from)
            .transpose()
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn identifier_taken(&self, email: &str, username: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl PatientStore for PgStore {
    async fn create_patient(&self, patient: NewPatient) -> Result<Patient> {
        let sql = format!(
            "INSERT INTO patients (id, first_name, last_name, date_of_birth, phone, email, \
                                   primary_dentist_id, registered_by_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PATIENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(&patient.first_name)
            .bind(&patient.last_name)
            .bind(patient.date_of_birth)
            .bind(&patient.phone)
            .bind(&patient.email)
            .bind(patient.primary_dentist_id)
            .bind(patient.registered_by_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.into())
    }

    async fn list_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>> {
        let sql = format!(
            "SELECT {PATIENT_COLUMNS} FROM patients \
             WHERE ($1::uuid IS NULL OR primary_dentist_id = $1) \
               AND ($2::text IS NULL \
                    OR first_name ILIKE $2 OR last_name ILIKE $2 \
                    OR email ILIKE $2 OR phone LIKE $2) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(filter.primary_dentist_id)
            .bind(search_term(filter.search.as_deref()))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Patient::from).collect())
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1");
        let row = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Patient::from))
    }

    async fn update_patient(&self, id: Uuid, update: &PatientUpdate) -> Result<Option<Patient>> {
        let sql = format!(
            "UPDATE patients SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                date_of_birth = COALESCE($4, date_of_birth), \
                phone = COALESCE($5, phone), \
                email = COALESCE($6, email), \
                primary_dentist_id = COALESCE($7, primary_dentist_id), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {PATIENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(id)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(update.date_of_birth)
            .bind(&update.phone)
            .bind(&update.email)
            .bind(update.primary_dentist_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.map(Patient::from))
    }

    async fn delete_patient(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_for_dentist(&self, dentist_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM patients WHERE primary_dentist_id = $1",
        )
        .bind(dentist_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
