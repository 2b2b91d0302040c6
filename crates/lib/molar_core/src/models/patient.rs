//! Patient record models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A clinic patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Staff account of the doctor primarily responsible for this patient.
    pub primary_dentist_id: Option<Uuid>,
    pub registered_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new patient.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub primary_dentist_id: Option<Uuid>,
    /// Filled from the request identity, never from the body.
    #[serde(skip)]
    pub registered_by_id: Option<Uuid>,
}

/// Partial update of a patient; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub primary_dentist_id: Option<Uuid>,
}

/// Patient listing filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientFilter {
    /// Case-insensitive substring over names and email; plain substring over phone.
    pub search: Option<String>,
    pub primary_dentist_id: Option<Uuid>,
}

impl Patient {
    /// Whether this patient matches a listing filter.
    pub fn matches(&self, filter: &PatientFilter) -> bool {
        if let Some(dentist) = filter.primary_dentist_id
            && self.primary_dentist_id != Some(dentist)
        {
            return false;
        }
        match filter.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let needle = term.to_lowercase();
                let contains = |s: &str| s.to_lowercase().contains(&needle);
                contains(&self.first_name)
                    || contains(&self.last_name)
                    || self.email.as_deref().is_some_and(contains)
                    || self.phone.as_deref().is_some_and(|p| p.contains(term))
            }
        }
    }
}
