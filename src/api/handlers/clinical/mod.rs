//! Patient histories, their costs, and appointments.
//!
//! Flow Overview:
//! 1) Nested routes (`/patients/{pk}/history/{hid}[/cost]`) resolve user `pk`
//!    to its patient profile (404 when missing), load history `hid` (404 when
//!    missing), then check that the history belongs to that patient. A foreign
//!    history answers 404 with a `message` naming the history id.
//! 2) Payloads are validated field by field in `validate`, then references to
//!    doctors and histories are checked against the database.
//! 3) Appointments are top-level and split by their confirmation flag.

pub mod appointments;
pub mod costs;
pub mod histories;
pub(crate) mod storage;
pub mod types;
pub(crate) mod validate;

use sqlx::PgPool;

use self::{
    storage::{fetch_history, patient_for_user},
    types::HistoryRow,
};
use super::{error::ApiError, validation::parse_pk};

/// Patient profile id for user `pk`.
pub(crate) async fn patient_of(pool: &PgPool, pk: &str) -> Result<i64, ApiError> {
    let user_id = parse_pk(pk)?;
    patient_for_user(pool, user_id)
        .await?
        .ok_or(ApiError::NotFound)
}

/// History `hid`, provided it belongs to the patient of user `pk`.
pub(crate) async fn owned_history(
    pool: &PgPool,
    pk: &str,
    hid: &str,
) -> Result<HistoryRow, ApiError> {
    let patient_id = patient_of(pool, pk).await?;
    let history_id = parse_pk(hid)?;
    let history = fetch_history(pool, history_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    ensure_owner(&history, patient_id)?;
    Ok(history)
}

pub(crate) fn ensure_owner(history: &HistoryRow, patient_id: i64) -> Result<(), ApiError> {
    if history.patient_id == patient_id {
        Ok(())
    } else {
        Err(ApiError::NotOwned(history.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::fields::Department;
    use chrono::NaiveDate;

    fn history(patient_id: i64) -> HistoryRow {
        HistoryRow {
            id: 11,
            admit_date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap_or_default(),
            symptoms: "cough".to_string(),
            department: Department::Immunologists,
            release_date: None,
            patient_id,
            assigned_doctor_id: 1,
        }
    }

    #[test]
    fn owner_passes() {
        assert!(ensure_owner(&history(3), 3).is_ok());
    }

    #[test]
    fn foreign_history_is_not_owned() {
        assert!(matches!(
            ensure_owner(&history(3), 4),
            Err(ApiError::NotOwned(11))
        ));
    }
}
