//! Cost record of a single history.

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use super::{
    owned_history, storage,
    types::{CostInput, CostResponse},
    validate,
};
use crate::api::handlers::{
    error::ApiError,
    validation::{envelope, payload_body, take_envelope},
};

const ENVELOPE: &str = "patient_cost";

#[utoipa::path(
    get,
    path = "/api/admin/patients/{pk}/history/{hid}/cost",
    params(
        ("pk" = i64, Path, description = "Patient user id"),
        ("hid" = i64, Path, description = "History id"),
    ),
    responses(
        (status = 200, description = "Cost with `total_cost`, wrapped in `patient_cost`.", body = CostResponse),
        (status = 404, description = "No cost recorded, or history missing/foreign."),
    ),
    security(("token" = [])),
    tag = "costs"
)]
pub async fn get_cost(
    Path((pk, hid)): Path<(String, String)>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    let history = owned_history(&pool, &pk, &hid).await?;
    let cost = storage::fetch_cost(&pool, history.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(envelope(ENVELOPE, cost)?).into_response())
}

#[utoipa::path(
    put,
    path = "/api/admin/patients/{pk}/history/{hid}/cost",
    params(
        ("pk" = i64, Path, description = "Patient user id"),
        ("hid" = i64, Path, description = "History id"),
    ),
    request_body(content = CostInput, description = "Wrapped in `patient_cost`. All charges are required the first time."),
    responses(
        (status = 200, description = "Stored cost, wrapped in `patient_cost`.", body = CostResponse),
        (status = 400, description = "Field errors wrapped in `patient_cost`."),
        (status = 404, description = "History missing or foreign."),
    ),
    security(("token" = [])),
    tag = "costs"
)]
/// Create the cost record or update some of its charges.
pub async fn put_cost(
    Path((pk, hid)): Path<(String, String)>,
    pool: Extension<PgPool>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let history = owned_history(&pool, &pk, &hid).await?;
    let input: CostInput = take_envelope(payload_body(payload), ENVELOPE)?;
    let existing = storage::fetch_cost(&pool, history.id).await?;
    let changes = validate::charge_changes(input, existing.is_none())
        .map_err(|errors| errors.into_envelope(ENVELOPE))?;

    let cost = match (existing, changes.complete()) {
        (None, Some(charges)) => {
            let cost = storage::insert_cost(&pool, history.id, charges).await?;
            info!(history_id = history.id, total = %cost.total_cost, "cost recorded");
            cost
        }
        (None, None) => return Err(ApiError::BadRequest("All charges are required.")),
        (Some(_), _) => storage::update_cost(&pool, history.id, changes)
            .await?
            .ok_or(ApiError::NotFound)?,
    };
    Ok(Json(envelope(ENVELOPE, cost)?).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/admin/patients/{pk}/history/{hid}/cost",
    params(
        ("pk" = i64, Path, description = "Patient user id"),
        ("hid" = i64, Path, description = "History id"),
    ),
    responses(
        (status = 204, description = "Cost deleted."),
        (status = 404, description = "No cost recorded, or history missing/foreign."),
    ),
    security(("token" = [])),
    tag = "costs"
)]
pub async fn delete_cost(
    Path((pk, hid)): Path<(String, String)>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    let history = owned_history(&pool, &pk, &hid).await?;
    if !storage::delete_cost(&pool, history.id).await? {
        return Err(ApiError::NotFound);
    }
    info!(history_id = history.id, "cost deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
