//! In-memory stores for tests and database-less development runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, PatientStore, Result, StoreError, UserStore};
use crate::models::auth::{CredentialRecord, NewUser, UserFilter, UserUpdate};
use crate::models::patient::{NewPatient, Patient, PatientFilter, PatientUpdate};

/// Users and patients held in process memory. Data is lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, CredentialRecord>>,
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(key);
    items
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>> {
        let users = self.users.read().await;
        let by_username = users.values().find(|u| u.username == identifier);
        let found = by_username.or_else(|| users.values().find(|u| u.email == identifier));
        Ok(found.cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CredentialRecord>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<CredentialRecord> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(StoreError::Conflict(
                "email or username already in use".into(),
            ));
        }
        let now = Utc::now();
        let record = CredentialRecord {
            id: Uuid::now_v7(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            phone: user.phone,
            specialization: user.specialization,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<CredentialRecord>> {
        let users = self.users.read().await;
        let matching = users.values().filter(|u| u.matches(filter)).cloned().collect();
        Ok(sorted_by(matching, |u| (u.created_at, u.id)))
    }

    async fn update_user(
        &self,
        id: Uuid,
        update: &UserUpdate,
    ) -> Result<Option<CredentialRecord>> {
        let mut users = self.users.write().await;
        if let Some(email) = &update.email
            && users.values().any(|u| u.id != id && &u.email == email)
        {
            return Err(StoreError::Conflict("email already in use".into()));
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = &update.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &update.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &update.email {
            user.email = v.clone();
        }
        if let Some(v) = &update.phone {
            user.phone = Some(v.clone());
        }
        if let Some(v) = &update.specialization {
            user.specialization = Some(v.clone());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn identifier_taken(&self, email: &str, username: &str) -> Result<bool> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .any(|u| u.email == email || u.username == username))
    }
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn create_patient(&self, patient: NewPatient) -> Result<Patient> {
        let now = Utc::now();
        let record = Patient {
            id: Uuid::now_v7(),
            first_name: patient.first_name,
            last_name: patient.last_name,
            date_of_birth: patient.date_of_birth,
            phone: patient.phone,
            email: patient.email,
            primary_dentist_id: patient.primary_dentist_id,
            registered_by_id: patient.registered_by_id,
            created_at: now,
            updated_at: now,
        };
        self.patients
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>> {
        let patients = self.patients.read().await;
        let matching = patients
            .values()
            .filter(|p| p.matches(filter))
            .cloned()
            .collect();
        Ok(sorted_by(matching, |p| {
            std::cmp::Reverse((p.created_at, p.id))
        }))
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>> {
        Ok(self.patients.read().await.get(&id).cloned())
    }

    async fn update_patient(&self, id: Uuid, update: &PatientUpdate) -> Result<Option<Patient>> {
        let mut patients = self.patients.write().await;
        let Some(patient) = patients.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = &update.first_name {
            patient.first_name = v.clone();
        }
        if let Some(v) = &update.last_name {
            patient.last_name = v.clone();
        }
        if update.date_of_birth.is_some() {
            patient.date_of_birth = update.date_of_birth;
        }
        if let Some(v) = &update.phone {
            patient.phone = Some(v.clone());
        }
        if let Some(v) = &update.email {
            patient.email = Some(v.clone());
        }
        if update.primary_dentist_id.is_some() {
            patient.primary_dentist_id = update.primary_dentist_id;
        }
        patient.updated_at = Utc::now();
        Ok(Some(patient.clone()))
    }

    async fn delete_patient(&self, id: Uuid) -> Result<bool> {
        Ok(self.patients.write().await.remove(&id).is_some())
    }

    async fn count_for_dentist(&self, dentist_id: Uuid) -> Result<i64> {
        let patients = self.patients.read().await;
        let count = patients
            .values()
            .filter(|p| p.primary_dentist_id == Some(dentist_id))
            .count();
        Ok(count as i64)
    }
}
