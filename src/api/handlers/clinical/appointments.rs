//! Appointment endpoints. Confirmed and pending appointments live under
//! separate route prefixes but share one table, split by `status`.

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use super::{
    storage,
    types::{AppointmentInput, AppointmentResponse},
    validate,
};
use crate::api::handlers::{
    error::{foreign_key_violation, ApiError},
    fields::missing_pk_message,
    validation::{envelope, parse_pk, payload_body, take_envelope, FieldErrors},
};

const ENVELOPE: &str = "appointments";

/// Check that referenced history and doctor rows exist.
async fn check_references(
    pool: &PgPool,
    patient_history_id: Option<i64>,
    doctor_id: Option<i64>,
) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    if let Some(history_id) = patient_history_id {
        if !storage::history_exists(pool, history_id).await? {
            errors.add("patient_history", missing_pk_message(history_id));
        }
    }
    if let Some(doctor_id) = doctor_id {
        if !storage::doctor_exists(pool, doctor_id).await? {
            errors.add("doctor", missing_pk_message(doctor_id));
        }
    }
    errors.finish(()).map_err(|errors| errors.into_envelope(ENVELOPE))
}

/// Map a foreign-key violation from a reference deleted after
/// [`check_references`] to the same field error.
fn vanished_reference(
    err: sqlx::Error,
    patient_history_id: Option<i64>,
    doctor_id: Option<i64>,
) -> ApiError {
    let (field, pk) = match foreign_key_violation(&err) {
        None => return ApiError::Database(err),
        Some(constraint) if constraint.contains("doctor") => ("doctor", doctor_id),
        Some(_) => ("patient_history", patient_history_id),
    };
    match pk {
        Some(pk) => FieldErrors::single(field, missing_pk_message(pk)).into_envelope(ENVELOPE),
        None => ApiError::Database(err),
    }
}

async fn list(pool: &PgPool, confirmed: bool) -> Result<Response, ApiError> {
    let appointments: Vec<AppointmentResponse> = storage::fetch_appointments(pool, confirmed)
        .await?
        .into_iter()
        .map(|row| row.into_response())
        .collect();
    Ok(Json(envelope(ENVELOPE, appointments)?).into_response())
}

async fn detail(pool: &PgPool, pk: &str) -> Result<Response, ApiError> {
    let appointment_id = parse_pk(pk)?;
    let appointment = storage::fetch_appointment(pool, appointment_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(envelope(ENVELOPE, appointment.into_response())?).into_response())
}

async fn update(pool: &PgPool, pk: &str, body: Value) -> Result<Response, ApiError> {
    let appointment_id = parse_pk(pk)?;
    if storage::fetch_appointment(pool, appointment_id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let input: AppointmentInput = take_envelope(body, ENVELOPE)?;
    let changes =
        validate::appointment_changes(input).map_err(|errors| errors.into_envelope(ENVELOPE))?;
    check_references(pool, changes.patient_history_id, changes.doctor_id.flatten()).await?;

    let updated = storage::update_appointment(pool, appointment_id, &changes)
        .await
        .map_err(|err| {
            vanished_reference(err, changes.patient_history_id, changes.doctor_id.flatten())
        })?;
    if !updated {
        return Err(ApiError::NotFound);
    }
    if let Some(status) = changes.status {
        info!(appointment_id, status, "appointment status changed");
    }
    detail(pool, pk).await
}

async fn remove(pool: &PgPool, pk: &str) -> Result<Response, ApiError> {
    let appointment_id = parse_pk(pk)?;
    if !storage::delete_appointment(pool, appointment_id).await? {
        return Err(ApiError::NotFound);
    }
    info!("Appointment with id `{appointment_id}` has been deleted.");
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    get,
    path = "/api/admin/appointments",
    responses(
        (status = 200, description = "Confirmed appointments, wrapped in `appointments`.", body = [AppointmentResponse]),
        (status = 401, description = "Missing or invalid token."),
        (status = 403, description = "Caller is not an admin."),
    ),
    security(("token" = [])),
    tag = "appointments"
)]
pub async fn list_appointments(pool: Extension<PgPool>) -> Result<Response, ApiError> {
    list(&pool, true).await
}

#[utoipa::path(
    post,
    path = "/api/admin/appointments",
    request_body(content = AppointmentInput, description = "Wrapped in `appointments`."),
    responses(
        (status = 201, description = "Appointment created, wrapped in `appointments`.", body = AppointmentResponse),
        (status = 400, description = "Field errors wrapped in `appointments`."),
    ),
    security(("token" = [])),
    tag = "appointments"
)]
/// Book an appointment. `status` defaults to pending.
pub async fn create_appointment(
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let input: AppointmentInput = take_envelope(payload_body(payload), ENVELOPE)?;
    let appointment =
        validate::new_appointment(input).map_err(|errors| errors.into_envelope(ENVELOPE))?;
    check_references(
        &pool,
        Some(appointment.patient_history_id),
        appointment.doctor_id,
    )
    .await?;

    let appointment_id = storage::insert_appointment(&pool, &appointment)
        .await
        .map_err(|err| {
            vanished_reference(err, Some(appointment.patient_history_id), appointment.doctor_id)
        })?;
    info!(appointment_id, "appointment created");

    let created = storage::fetch_appointment(&pool, appointment_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok((
        StatusCode::CREATED,
        Json(envelope(ENVELOPE, created.into_response())?),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/admin/appointments/{pk}",
    params(("pk" = i64, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment, wrapped in `appointments`.", body = AppointmentResponse),
        (status = 404, description = "No appointment with this id."),
    ),
    security(("token" = [])),
    tag = "appointments"
)]
pub async fn get_appointment(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    detail(&pool, &pk).await
}

#[utoipa::path(
    put,
    path = "/api/admin/appointments/{pk}",
    params(("pk" = i64, Path, description = "Appointment id")),
    request_body(content = AppointmentInput, description = "Partial update wrapped in `appointments`."),
    responses(
        (status = 200, description = "Updated appointment, wrapped in `appointments`.", body = AppointmentResponse),
        (status = 400, description = "Field errors wrapped in `appointments`."),
        (status = 404, description = "No appointment with this id."),
    ),
    security(("token" = [])),
    tag = "appointments"
)]
pub async fn update_appointment(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    update(&pool, &pk, payload_body(payload)).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/appointments/{pk}",
    params(("pk" = i64, Path, description = "Appointment id")),
    responses(
        (status = 204, description = "Appointment deleted."),
        (status = 404, description = "No appointment with this id."),
    ),
    security(("token" = [])),
    tag = "appointments"
)]
pub async fn delete_appointment(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    remove(&pool, &pk).await
}

#[utoipa::path(
    get,
    path = "/api/admin/appointment-approvals",
    responses(
        (status = 200, description = "Pending appointments, wrapped in `appointments`.", body = [AppointmentResponse]),
    ),
    security(("token" = [])),
    tag = "appointments"
)]
pub async fn list_pending_appointments(pool: Extension<PgPool>) -> Result<Response, ApiError> {
    list(&pool, false).await
}

#[utoipa::path(
    get,
    path = "/api/admin/appointment-approvals/{pk}",
    params(("pk" = i64, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment, wrapped in `appointments`.", body = AppointmentResponse),
        (status = 404, description = "No appointment with this id."),
    ),
    security(("token" = [])),
    tag = "appointments"
)]
pub async fn get_pending_appointment(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    detail(&pool, &pk).await
}

#[utoipa::path(
    put,
    path = "/api/admin/appointment-approvals/{pk}",
    params(("pk" = i64, Path, description = "Appointment id")),
    request_body(content = AppointmentInput, description = "`{\"appointments\": {\"status\": true}}` confirms."),
    responses(
        (status = 200, description = "Updated appointment, wrapped in `appointments`.", body = AppointmentResponse),
        (status = 400, description = "Field errors wrapped in `appointments`."),
        (status = 404, description = "No appointment with this id."),
    ),
    security(("token" = [])),
    tag = "appointments"
)]
/// Confirm (or otherwise update) a pending appointment.
pub async fn approve_appointment(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    update(&pool, &pk, payload_body(payload)).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/appointment-approvals/{pk}",
    params(("pk" = i64, Path, description = "Appointment id")),
    responses(
        (status = 204, description = "Appointment request deleted."),
        (status = 404, description = "No appointment with this id."),
    ),
    security(("token" = [])),
    tag = "appointments"
)]
pub async fn reject_appointment(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    remove(&pool, &pk).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::error::constraint_error;

    #[test]
    fn deleted_references_become_field_errors() {
        let err = constraint_error("23503", "appointments_doctor_id_fkey");
        let ApiError::Validation(body) = vanished_reference(err, Some(2), Some(8)) else {
            panic!("expected validation error");
        };
        assert_eq!(
            body[ENVELOPE]["doctor"][0],
            "Invalid pk \"8\" - object does not exist."
        );

        let err = constraint_error("23503", "appointments_patient_history_id_fkey");
        let ApiError::Validation(body) = vanished_reference(err, Some(2), None) else {
            panic!("expected validation error");
        };
        assert_eq!(
            body[ENVELOPE]["patient_history"][0],
            "Invalid pk \"2\" - object does not exist."
        );
    }

    #[test]
    fn unrelated_errors_stay_database_errors() {
        let err = constraint_error("23505", "appointments_pkey");
        assert!(matches!(
            vanished_reference(err, Some(2), Some(8)),
            ApiError::Database(_)
        ));
    }
}
