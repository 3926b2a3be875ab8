//! Patient history endpoints nested under a patient account.

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use super::{
    owned_history, patient_of, storage,
    types::{HistoryInput, HistoryResponse},
    validate,
};
use crate::api::handlers::{
    error::{foreign_key_violation, ApiError},
    fields::missing_pk_message,
    validation::{envelope, payload_body, take_envelope, FieldErrors},
};

const ENVELOPE: &str = "patient_history";

async fn check_doctor(pool: &PgPool, doctor_id: Option<i64>) -> Result<(), ApiError> {
    let Some(doctor_id) = doctor_id else {
        return Ok(());
    };
    if storage::doctor_exists(pool, doctor_id).await? {
        Ok(())
    } else {
        Err(FieldErrors::single("assigned_doctor", missing_pk_message(doctor_id)).into_envelope(ENVELOPE))
    }
}

/// Map a foreign-key violation from a row deleted after the existence checks:
/// a missing doctor is a field error, a missing patient a `404`.
fn vanished_reference(err: sqlx::Error, doctor_id: Option<i64>) -> ApiError {
    let doctor_gone = match foreign_key_violation(&err) {
        None => return ApiError::Database(err),
        Some(constraint) => constraint.contains("assigned_doctor"),
    };
    match doctor_id {
        Some(doctor_id) if doctor_gone => {
            FieldErrors::single("assigned_doctor", missing_pk_message(doctor_id))
                .into_envelope(ENVELOPE)
        }
        _ => ApiError::NotFound,
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/patients/{pk}/history",
    params(("pk" = i64, Path, description = "Patient user id")),
    responses(
        (status = 200, description = "Histories of the patient, wrapped in `patient_history`.", body = [HistoryResponse]),
        (status = 404, description = "User missing or not a patient."),
    ),
    security(("token" = [])),
    tag = "histories"
)]
pub async fn list_histories(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    let patient_id = patient_of(&pool, &pk).await?;
    let histories: Vec<HistoryResponse> = storage::fetch_histories(&pool, patient_id)
        .await?
        .into_iter()
        .map(|row| row.into_response())
        .collect();
    Ok(Json(envelope(ENVELOPE, histories)?).into_response())
}

#[utoipa::path(
    post,
    path = "/api/admin/patients/{pk}/history",
    params(("pk" = i64, Path, description = "Patient user id")),
    request_body(content = HistoryInput, description = "Wrapped in `patient_history`."),
    responses(
        (status = 201, description = "History created, wrapped in `patient_history`.", body = HistoryResponse),
        (status = 400, description = "Field errors wrapped in `patient_history`."),
        (status = 404, description = "User missing or not a patient."),
    ),
    security(("token" = [])),
    tag = "histories"
)]
/// Admit a patient. `admit_date` is set to today.
pub async fn create_history(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let patient_id = patient_of(&pool, &pk).await?;
    let input: HistoryInput = take_envelope(payload_body(payload), ENVELOPE)?;
    let history = validate::new_history(input, Utc::now().date_naive())
        .map_err(|errors| errors.into_envelope(ENVELOPE))?;
    check_doctor(&pool, Some(history.assigned_doctor_id)).await?;

    let created = storage::insert_history(&pool, patient_id, &history)
        .await
        .map_err(|err| vanished_reference(err, Some(history.assigned_doctor_id)))?;
    info!(history_id = created.id, patient_id, "history created");
    Ok((
        StatusCode::CREATED,
        Json(envelope(ENVELOPE, created.into_response())?),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/admin/patients/{pk}/history/{hid}",
    params(
        ("pk" = i64, Path, description = "Patient user id"),
        ("hid" = i64, Path, description = "History id"),
    ),
    responses(
        (status = 200, description = "History, wrapped in `patient_history`.", body = HistoryResponse),
        (status = 404, description = "Missing, or owned by another patient."),
    ),
    security(("token" = [])),
    tag = "histories"
)]
pub async fn get_history(
    Path((pk, hid)): Path<(String, String)>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    let history = owned_history(&pool, &pk, &hid).await?;
    Ok(Json(envelope(ENVELOPE, history.into_response())?).into_response())
}

#[utoipa::path(
    put,
    path = "/api/admin/patients/{pk}/history/{hid}",
    params(
        ("pk" = i64, Path, description = "Patient user id"),
        ("hid" = i64, Path, description = "History id"),
    ),
    request_body(content = HistoryInput, description = "Partial update wrapped in `patient_history`."),
    responses(
        (status = 200, description = "Updated history, wrapped in `patient_history`.", body = HistoryResponse),
        (status = 400, description = "Field errors wrapped in `patient_history`."),
        (status = 404, description = "Missing, or owned by another patient."),
    ),
    security(("token" = [])),
    tag = "histories"
)]
/// Partially update a history; a `null` `release_date` clears it.
pub async fn update_history(
    Path((pk, hid)): Path<(String, String)>,
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let history = owned_history(&pool, &pk, &hid).await?;
    let input: HistoryInput = take_envelope(payload_body(payload), ENVELOPE)?;
    let changes = validate::history_changes(input, history.admit_date)
        .map_err(|errors| errors.into_envelope(ENVELOPE))?;
    check_doctor(&pool, changes.assigned_doctor_id).await?;

    let updated = storage::update_history(&pool, history.id, &changes)
        .await
        .map_err(|err| vanished_reference(err, changes.assigned_doctor_id))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(envelope(ENVELOPE, updated.into_response())?).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/admin/patients/{pk}/history/{hid}",
    params(
        ("pk" = i64, Path, description = "Patient user id"),
        ("hid" = i64, Path, description = "History id"),
    ),
    responses(
        (status = 204, description = "History deleted with its appointments and cost."),
        (status = 404, description = "Missing, or owned by another patient."),
    ),
    security(("token" = [])),
    tag = "histories"
)]
pub async fn delete_history(
    Path((pk, hid)): Path<(String, String)>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    let history = owned_history(&pool, &pk, &hid).await?;
    if !storage::delete_history(&pool, history.id).await? {
        return Err(ApiError::NotFound);
    }
    info!("History with id `{}` has been deleted.", history.id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::error::constraint_error;

    #[test]
    fn deleted_doctor_becomes_a_field_error() {
        let err = constraint_error("23503", "patient_histories_assigned_doctor_id_fkey");
        let ApiError::Validation(body) = vanished_reference(err, Some(4)) else {
            panic!("expected validation error");
        };
        assert_eq!(
            body[ENVELOPE]["assigned_doctor"][0],
            "Invalid pk \"4\" - object does not exist."
        );
    }

    #[test]
    fn deleted_patient_is_not_found() {
        let err = constraint_error("23503", "patient_histories_patient_id_fkey");
        assert!(matches!(vanished_reference(err, Some(4)), ApiError::NotFound));
    }

    #[test]
    fn other_database_errors_pass_through() {
        let err = constraint_error("23514", "patient_histories_department_check");
        assert!(matches!(vanished_reference(err, None), ApiError::Database(_)));
    }
}
