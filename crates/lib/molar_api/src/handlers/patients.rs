//! Patient record handlers.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use molar_core::models::patient::{NewPatient, Patient, PatientFilter, PatientUpdate};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{PatientListQuery, parse_id};
use crate::response::{ApiResponse, MessageResponse};
use crate::services::patients;

/// `POST /api/patients`
pub async fn create_patient_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
    Json(body): Json<NewPatient>,
) -> AppResult<ApiResponse<Patient>> {
    let patient = patients::create_patient(
        state.patients.as_ref(),
        state.users.as_ref(),
        body,
        &identity.user_id,
    )
    .await?;
    Ok(ApiResponse::created(patient).with_message("Patient created successfully"))
}

/// `GET /api/patients?search=&primaryDentistId=`
pub async fn list_patients_handler(
    State(state): State<AppState>,
    Query(query): Query<PatientListQuery>,
) -> AppResult<ApiResponse<Vec<Patient>>> {
    let filter = PatientFilter::try_from(query)?;
    let list = patients::list_patients(state.patients.as_ref(), &filter).await?;
    Ok(ApiResponse::ok(list))
}

/// `GET /api/patients/{id}`
pub async fn get_patient_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Patient>> {
    let patient = patients::get_patient(state.patients.as_ref(), parse_id(&id)?).await?;
    Ok(ApiResponse::ok(patient))
}

/// `PUT /api/patients/{id}`
pub async fn update_patient_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PatientUpdate>,
) -> AppResult<ApiResponse<Patient>> {
    let patient = patients::update_patient(
        state.patients.as_ref(),
        state.users.as_ref(),
        parse_id(&id)?,
        &body,
    )
    .await?;
    Ok(ApiResponse::ok(patient).with_message("Patient updated successfully"))
}

/// `DELETE /api/patients/{id}`
pub async fn delete_patient_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let resp = patients::delete_patient(state.patients.as_ref(), parse_id(&id)?).await?;
    let message = resp.message.clone();
    Ok(ApiResponse::ok(resp).with_message(message))
}
