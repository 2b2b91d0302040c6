//! Staff account management.

use molar_core::auth::password::hash_password;
use molar_core::models::auth::{NewUser, Role, UserFilter, UserUpdate, UserView};
use molar_core::store::{PatientStore, UserStore};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::CreateUserRequest;
use crate::response::MessageResponse;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

/// Create a staff account. Email and username must both be unused.
pub async fn create_user(store: &dyn UserStore, req: CreateUserRequest) -> AppResult<UserView> {
    req.validate()?;

    let email = req.email.trim().to_string();
    let username = req.username.trim().to_string();
    if store.identifier_taken(&email, &username).await? {
        return Err(AppError::Conflict(
            "User with this email or username already exists".into(),
        ));
    }

    let specialization = req.specialization.filter(|_| req.role == Role::Doctor);
    let record = store
        .create_user(NewUser {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email,
            username,
            password_hash: hash_password(&req.password)?,
            role: req.role,
            phone: req.phone,
            specialization,
        })
        .await?;

    info!(user_id = %record.id, role = %record.role, "user created");
    Ok(record.view())
}

pub async fn list_users(store: &dyn UserStore, filter: &UserFilter) -> AppResult<Vec<UserView>> {
    let records = store.list_users(filter).await?;
    Ok(records.iter().map(|r| r.view()).collect())
}

pub async fn get_user(store: &dyn UserStore, id: Uuid) -> AppResult<UserView> {
    store
        .find_by_id(id)
        .await?
        .map(|r| r.view())
        .ok_or_else(user_not_found)
}

/// The caller's own profile. Doctors also get their patient count.
pub async fn get_me(
    users: &dyn UserStore,
    patients: &dyn PatientStore,
    user_id: &str,
) -> AppResult<UserView> {
    let id = Uuid::parse_str(user_id).map_err(|_| user_not_found())?;
    let mut view = get_user(users, id).await?;
    if view.role == Role::Doctor {
        view.patient_count = Some(patients.count_for_dentist(id).await?);
    }
    Ok(view)
}

/// Apply a partial profile update. `specialization` only sticks for doctors.
pub async fn update_user(
    store: &dyn UserStore,
    id: Uuid,
    mut update: UserUpdate,
) -> AppResult<UserView> {
    let current = store.find_by_id(id).await?.ok_or_else(user_not_found)?;
    if current.role != Role::Doctor {
        update.specialization = None;
    }
    if let Some(email) = &update.email
        && !email.contains('@')
    {
        return Err(AppError::validation("email must be an email address"));
    }

    let record = store
        .update_user(id, &update)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(record.view())
}

/// Update the caller's own profile.
pub async fn update_me(
    store: &dyn UserStore,
    user_id: &str,
    update: UserUpdate,
) -> AppResult<UserView> {
    let id = Uuid::parse_str(user_id).map_err(|_| user_not_found())?;
    update_user(store, id, update).await
}

pub async fn delete_user(store: &dyn UserStore, id: Uuid) -> AppResult<MessageResponse> {
    if !store.delete_user(id).await? {
        return Err(user_not_found());
    }
    info!(user_id = %id, "user deleted");
    Ok(MessageResponse::new("User deleted successfully"))
}

#[cfg(test)]
mod tests {
    use molar_core::models::patient::NewPatient;
    use molar_core::store::memory::MemoryStore;

    use super::*;

    fn doctor_request() -> CreateUserRequest {
        CreateUserRequest {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "doctor@clinic.com".into(),
            username: "doctor".into(),
            password: "password123".into(),
            role: Role::Doctor,
            phone: Some("555-0101".into()),
            specialization: Some("Orthodontics".into()),
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = MemoryStore::new();
        let created = create_user(&store, doctor_request()).await.unwrap();
        let fetched = get_user(&store, created.id).await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.specialization.as_deref(), Some("Orthodontics"));
    }

    #[tokio::test]
    async fn duplicate_identifier_conflicts() {
        let store = MemoryStore::new();
        create_user(&store, doctor_request()).await.unwrap();

        let mut same_email = doctor_request();
        same_email.username = "other".into();
        let err = create_user(&store, same_email).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(
            err.message(),
            "User with this email or username already exists"
        );
    }

    #[tokio::test]
    async fn specialization_is_dropped_for_non_doctors() {
        let store = MemoryStore::new();
        let mut req = doctor_request();
        req.role = Role::Assistant;
        let created = create_user(&store, req).await.unwrap();
        assert_eq!(created.specialization, None);

        let updated = update_user(
            &store,
            created.id,
            UserUpdate {
                specialization: Some("Surgery".into()),
                phone: Some("555-0199".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.specialization, None);
        assert_eq!(updated.phone.as_deref(), Some("555-0199"));
    }

    #[tokio::test]
    async fn doctor_profile_counts_patients() {
        let store = MemoryStore::new();
        let doctor = create_user(&store, doctor_request()).await.unwrap();
        for name in ["Ana", "Ben"] {
            store
                .create_patient(NewPatient {
                    first_name: name.into(),
                    last_name: "Patient".into(),
                    primary_dentist_id: Some(doctor.id),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let me = get_me(&store, &store, &doctor.id.to_string())
            .await
            .unwrap();
        assert_eq!(me.patient_count, Some(2));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let store = MemoryStore::new();
        let err = get_user(&store, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = delete_user(&store, Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err.message(), "User not found");
    }
}
