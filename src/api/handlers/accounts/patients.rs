//! Patient account endpoints.

use axum::{
    extract::{Extension, Json, Path},
    response::Response,
};
use serde_json::Value;
use sqlx::PgPool;

use super::{
    handlers,
    types::{AccountResponse, AccountUpdate, RegistrationRequest, RegistrationResponse},
    AccountKind,
};
use crate::api::handlers::{error::ApiError, validation::payload_body};

const KIND: AccountKind = AccountKind::Patient;

#[utoipa::path(
    post,
    path = "/api/admin/patient-registration",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Patient registered and approved.", body = RegistrationResponse),
        (status = 400, description = "`user_data` and `profile_data` field errors."),
        (status = 401, description = "Missing or invalid token."),
        (status = 403, description = "Caller is not an admin."),
    ),
    security(("token" = [])),
    tag = "patients"
)]
/// Register a patient account with its profile. Admin-created accounts start approved.
pub async fn register_patient(
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    handlers::register(&pool, KIND, payload_body(payload)).await
}

#[utoipa::path(
    get,
    path = "/api/admin/patients",
    responses(
        (status = 200, description = "Approved patients, wrapped in `patients`.", body = [AccountResponse]),
        (status = 401, description = "Missing or invalid token."),
        (status = 403, description = "Caller is not an admin."),
    ),
    security(("token" = [])),
    tag = "patients"
)]
pub async fn list_patients(pool: Extension<PgPool>) -> Result<Response, ApiError> {
    handlers::list(&pool, KIND, true).await
}

#[utoipa::path(
    get,
    path = "/api/admin/patients/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Patient, wrapped in `patients`.", body = AccountResponse),
        (status = 400, description = "Invalid id."),
        (status = 404, description = "No patient account with this id."),
    ),
    security(("token" = [])),
    tag = "patients"
)]
pub async fn get_patient(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    handlers::detail(&pool, KIND, &pk).await
}

#[utoipa::path(
    put,
    path = "/api/admin/patients/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    request_body(content = AccountUpdate, description = "Partial update wrapped in `patients`."),
    responses(
        (status = 200, description = "Updated patient, wrapped in `patients`.", body = AccountResponse),
        (status = 400, description = "Field errors wrapped in `patients`."),
        (status = 404, description = "No patient account with this id."),
    ),
    security(("token" = [])),
    tag = "patients"
)]
/// Partially update a patient. Profile fields go in a nested `profile` object.
pub async fn update_patient(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    handlers::update(&pool, KIND, &pk, payload_body(payload)).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/patients/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Patient deleted."),
        (status = 404, description = "No patient account with this id."),
    ),
    security(("token" = [])),
    tag = "patients"
)]
/// Delete a patient with its profile, histories, appointments and costs.
pub async fn delete_patient(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    handlers::remove(&pool, KIND, &pk, false).await
}

#[utoipa::path(
    get,
    path = "/api/admin/patient-approvals",
    responses(
        (status = 200, description = "Pending patients, wrapped in `patients`.", body = [AccountResponse]),
        (status = 401, description = "Missing or invalid token."),
        (status = 403, description = "Caller is not an admin."),
    ),
    security(("token" = [])),
    tag = "patients"
)]
pub async fn list_pending_patients(pool: Extension<PgPool>) -> Result<Response, ApiError> {
    handlers::list(&pool, KIND, false).await
}

#[utoipa::path(
    get,
    path = "/api/admin/patient-approvals/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Patient, wrapped in `patients`.", body = AccountResponse),
        (status = 404, description = "No patient account with this id."),
    ),
    security(("token" = [])),
    tag = "patients"
)]
pub async fn get_pending_patient(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    handlers::detail(&pool, KIND, &pk).await
}

#[utoipa::path(
    put,
    path = "/api/admin/patient-approvals/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    request_body(content = AccountUpdate, description = "`{\"patients\": {\"status\": true}}` approves."),
    responses(
        (status = 200, description = "Updated patient, wrapped in `patients`.", body = AccountResponse),
        (status = 400, description = "Field errors wrapped in `patients`."),
        (status = 404, description = "No patient account with this id."),
    ),
    security(("token" = [])),
    tag = "patients"
)]
/// Approve (or otherwise update) a pending patient.
pub async fn approve_patient(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    handlers::update(&pool, KIND, &pk, payload_body(payload)).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/patient-approvals/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Approval request rejected and deleted."),
        (status = 404, description = "No patient account with this id."),
    ),
    security(("token" = [])),
    tag = "patients"
)]
/// Reject a pending patient by deleting the account.
pub async fn reject_patient(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    handlers::remove(&pool, KIND, &pk, true).await
}
