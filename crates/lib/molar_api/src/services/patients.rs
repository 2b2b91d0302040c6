//! Patient records.

use molar_core::models::auth::Role;
use molar_core::models::patient::{NewPatient, Patient, PatientFilter, PatientUpdate};
use molar_core::store::{PatientStore, UserStore};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::MessageResponse;

fn patient_not_found() -> AppError {
    AppError::NotFound("Patient not found".into())
}

/// A primary dentist must be an existing staff account with the doctor role.
async fn ensure_dentist(users: &dyn UserStore, dentist_id: Option<Uuid>) -> AppResult<()> {
    let Some(id) = dentist_id else {
        return Ok(());
    };
    match users.find_by_id(id).await? {
        Some(user) if user.role == Role::Doctor => Ok(()),
        _ => Err(AppError::validation(format!(
            "primaryDentistId {id} does not belong to a doctor"
        ))),
    }
}

/// Register a patient on behalf of `registered_by`.
pub async fn create_patient(
    store: &dyn PatientStore,
    users: &dyn UserStore,
    mut patient: NewPatient,
    registered_by: &str,
) -> AppResult<Patient> {
    if patient.first_name.trim().is_empty() || patient.last_name.trim().is_empty() {
        return Err(AppError::validation(
            "firstName and lastName must not be empty",
        ));
    }
    ensure_dentist(users, patient.primary_dentist_id).await?;
    patient.registered_by_id = Uuid::parse_str(registered_by).ok();
    let created = store.create_patient(patient).await?;
    info!(patient_id = %created.id, "patient registered");
    Ok(created)
}

pub async fn list_patients(
    store: &dyn PatientStore,
    filter: &PatientFilter,
) -> AppResult<Vec<Patient>> {
    Ok(store.list_patients(filter).await?)
}

pub async fn get_patient(store: &dyn PatientStore, id: Uuid) -> AppResult<Patient> {
    store.get_patient(id).await?.ok_or_else(patient_not_found)
}

pub async fn update_patient(
    store: &dyn PatientStore,
    users: &dyn UserStore,
    id: Uuid,
    update: &PatientUpdate,
) -> AppResult<Patient> {
    ensure_dentist(users, update.primary_dentist_id).await?;
    store
        .update_patient(id, update)
        .await?
        .ok_or_else(patient_not_found)
}

pub async fn delete_patient(store: &dyn PatientStore, id: Uuid) -> AppResult<MessageResponse> {
    if !store.delete_patient(id).await? {
        return Err(patient_not_found());
    }
    info!(patient_id = %id, "patient deleted");
    Ok(MessageResponse::new("Patient deleted successfully"))
}

#[cfg(test)]
mod tests {
    use molar_core::models::auth::NewUser;
    use molar_core::store::memory::MemoryStore;

    use super::*;

    fn new_patient(first: &str) -> NewPatient {
        NewPatient {
            first_name: first.into(),
            last_name: "Lopez".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn records_who_registered_the_patient() {
        let store = MemoryStore::new();
        let staff = Uuid::now_v7();
        let created = create_patient(&store, &store, new_patient("Ana"), &staff.to_string())
            .await
            .unwrap();
        assert_eq!(created.registered_by_id, Some(staff));

        let dev = create_patient(&store, &store, new_patient("Ben"), "dev-manager-id")
            .await
            .unwrap();
        assert_eq!(dev.registered_by_id, None);
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let store = MemoryStore::new();
        let err = create_patient(&store, &store, new_patient("  "), "x")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn update_and_delete_missing_patient() {
        let store = MemoryStore::new();
        let id = Uuid::now_v7();
        let err = update_patient(&store, &store, id, &PatientUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Patient not found");
        let err = delete_patient(&store, id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    async fn add_staff(store: &MemoryStore, username: &str, role: Role) -> Uuid {
        store
            .create_user(NewUser {
                first_name: "Staff".into(),
                last_name: username.into(),
                email: format!("{username}@clinic.com"),
                username: username.into(),
                password_hash: "$2b$10$hash".into(),
                role,
                phone: None,
                specialization: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn primary_dentist_must_be_a_doctor() {
        let store = MemoryStore::new();
        let doctor = add_staff(&store, "doctor", Role::Doctor).await;
        let manager = add_staff(&store, "manager", Role::Manager).await;

        for dentist in [Uuid::now_v7(), manager] {
            let mut patient = new_patient("Ana");
            patient.primary_dentist_id = Some(dentist);
            let err = create_patient(&store, &store, patient, "x")
                .await
                .unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR");
        }
        assert!(store
            .list_patients(&PatientFilter::default())
            .await
            .unwrap()
            .is_empty());

        let mut patient = new_patient("Ana");
        patient.primary_dentist_id = Some(doctor);
        let created = create_patient(&store, &store, patient, "x").await.unwrap();
        assert_eq!(created.primary_dentist_id, Some(doctor));

        let err = update_patient(
            &store,
            &store,
            created.id,
            &PatientUpdate {
                primary_dentist_id: Some(manager),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        let unchanged = get_patient(&store, created.id).await.unwrap();
        assert_eq!(unchanged.primary_dentist_id, Some(doctor));
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let store = MemoryStore::new();
        let created = create_patient(&store, &store, new_patient("Ana"), "x").await.unwrap();
        let updated = update_patient(
            &store,
            &store,
            created.id,
            &PatientUpdate {
                phone: Some("555-0100".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.first_name, "Ana");
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
    }
}
