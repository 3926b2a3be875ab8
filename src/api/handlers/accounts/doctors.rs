//! Doctor account endpoints.

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

const KIND: AccountKind = AccountKind::Doctor;

#[utoipa::path(
    post,
    path = "/api/admin/doctor-registration",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Doctor registered and approved.", body = RegistrationResponse),
        (status = 400, description = "`user_data` and `profile_data` field errors."),
        (status = 401, description = "Missing or invalid token."),
        (status = 403, description = "Caller is not an admin."),
    ),
    security(("token" = [])),
    tag = "doctors"
)]
/// Register a doctor account with its profile. Admin-created accounts start approved.
pub async fn register_doctor(
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    handlers::register(&pool, KIND, payload_body(payload)).await
}

#[utoipa::path(
    get,
    path = "/api/admin/doctors",
    responses(
        (status = 200, description = "Approved doctors, wrapped in `doctors`.", body = [AccountResponse]),
        (status = 401, description = "Missing or invalid token."),
        (status = 403, description = "Caller is not an admin."),
    ),
    security(("token" = [])),
    tag = "doctors"
)]
pub async fn list_doctors(pool: Extension<PgPool>) -> Result<Response, ApiError> {
    handlers::list(&pool, KIND, true).await
}

#[utoipa::path(
    get,
    path = "/api/admin/doctors/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Doctor, wrapped in `doctors`.", body = AccountResponse),
        (status = 400, description = "Invalid id."),
        (status = 404, description = "No doctor account with this id."),
    ),
    security(("token" = [])),
    tag = "doctors"
)]
pub async fn get_doctor(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    handlers::detail(&pool, KIND, &pk).await
}

#[utoipa::path(
    put,
    path = "/api/admin/doctors/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    request_body(content = AccountUpdate, description = "Partial update wrapped in `doctors`."),
    responses(
        (status = 200, description = "Updated doctor, wrapped in `doctors`.", body = AccountResponse),
        (status = 400, description = "Field errors wrapped in `doctors`."),
        (status = 404, description = "No doctor account with this id."),
    ),
    security(("token" = [])),
    tag = "doctors"
)]
/// Partially update a doctor. Profile fields go in a nested `profile` object.
pub async fn update_doctor(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    handlers::update(&pool, KIND, &pk, payload_body(payload)).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/doctors/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Doctor deleted."),
        (status = 404, description = "No doctor account with this id."),
    ),
    security(("token" = [])),
    tag = "doctors"
)]
/// Delete a doctor with its profile and histories. Appointments lose their doctor.
pub async fn delete_doctor(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    handlers::remove(&pool, KIND, &pk, false).await
}

#[utoipa::path(
    get,
    path = "/api/admin/doctor-approvals",
    responses(
        (status = 200, description = "Pending doctors, wrapped in `doctors`.", body = [AccountResponse]),
        (status = 401, description = "Missing or invalid token."),
        (status = 403, description = "Caller is not an admin."),
    ),
    security(("token" = [])),
    tag = "doctors"
)]
pub async fn list_pending_doctors(pool: Extension<PgPool>) -> Result<Response, ApiError> {
    handlers::list(&pool, KIND, false).await
}

#[utoipa::path(
    get,
    path = "/api/admin/doctor-approvals/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Doctor, wrapped in `doctors`.", body = AccountResponse),
        (status = 404, description = "No doctor account with this id."),
    ),
    security(("token" = [])),
    tag = "doctors"
)]
pub async fn get_pending_doctor(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    handlers::detail(&pool, KIND, &pk).await
}

#[utoipa::path(
    put,
    path = "/api/admin/doctor-approvals/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    request_body(content = AccountUpdate, description = "`{\"doctors\": {\"status\": true}}` approves."),
    responses(
        (status = 200, description = "Updated doctor, wrapped in `doctors`.", body = AccountResponse),
        (status = 400, description = "Field errors wrapped in `doctors`."),
        (status = 404, description = "No doctor account with this id."),
    ),
    security(("token" = [])),
    tag = "doctors"
)]
/// Approve (or otherwise update) a pending doctor.
pub async fn approve_doctor(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    handlers::update(&pool, KIND, &pk, payload_body(payload)).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/doctor-approvals/{pk}",
    params(("pk" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Approval request rejected and deleted."),
        (status = 404, description = "No doctor account with this id."),
    ),
    security(("token" = [])),
    tag = "doctors"
)]
/// Reject a pending doctor by deleting the account.
pub async fn reject_doctor(
    Path(pk): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    handlers::remove(&pool, KIND, &pk, true).await
}
