//! Kind-generic request handling shared by the doctor and patient routes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{error, info};

use super::{
    storage::{
        delete_account, fetch_account, fetch_accounts, register_account, update_account,
        AccountWriteError,
    },
    types::{AccountUpdate, ProfileInput, RegistrationResponse, UserInput},
    validate::{validate_profile, validate_update, validate_user},
    AccountKind,
};
use crate::api::handlers::{
    auth::utils::hash_password,
    error::ApiError,
    validation::{envelope, multi_envelope, parse_pk, take_envelope, take_part, FieldErrors},
};

const MSG_DUPLICATE_USERNAME: &str = "A user with that username already exists.";
const MSG_NO_PROFILE: &str = "This account has no profile to update.";

pub(super) async fn register(
    pool: &PgPool,
    kind: AccountKind,
    mut body: Value,
) -> Result<Response, ApiError> {
    let user = take_part::<UserInput>(&mut body, "user_data").and_then(validate_user);
    let profile = take_part::<ProfileInput>(&mut body, "profile_data")
        .and_then(|input| validate_profile(kind, input));

    let (user, profile) = match (user, profile) {
        (Ok(user), Ok(profile)) => (user, profile),
        (user, profile) => {
            return Err(multi_envelope(vec![
                ("user_data", user.err().unwrap_or_default()),
                ("profile_data", profile.err().unwrap_or_default()),
            ]));
        }
    };

    let password_hash = hash_password(&user.password).map_err(ApiError::Internal)?;

    match register_account(pool, kind, &user, &password_hash, &profile).await {
        Ok((user_data, profile_data)) => {
            info!(user_id = user_data.id, kind = kind.group(), "account registered");
            Ok((
                StatusCode::CREATED,
                Json(RegistrationResponse {
                    user_data,
                    profile_data,
                }),
            )
                .into_response())
        }
        Err(AccountWriteError::DuplicateUsername) => Err(multi_envelope(vec![
            (
                "user_data",
                FieldErrors::single("username", MSG_DUPLICATE_USERNAME),
            ),
            ("profile_data", FieldErrors::new()),
        ])),
        Err(AccountWriteError::MissingProfile) => Err(ApiError::Internal(anyhow::anyhow!(
            "profile row missing right after insert"
        ))),
        Err(AccountWriteError::Database(err)) => {
            error!("Failed to register {}: {err}", kind.group());
            Err(ApiError::Database(err))
        }
    }
}

pub(super) async fn list(
    pool: &PgPool,
    kind: AccountKind,
    approved: bool,
) -> Result<Response, ApiError> {
    let accounts = fetch_accounts(pool, kind, approved).await?;
    Ok(Json(envelope(kind.envelope(), accounts)?).into_response())
}

pub(super) async fn detail(pool: &PgPool, kind: AccountKind, pk: &str) -> Result<Response, ApiError> {
    let user_id = parse_pk(pk)?;
    let account = fetch_account(pool, kind, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(envelope(kind.envelope(), account)?).into_response())
}

pub(super) async fn update(
    pool: &PgPool,
    kind: AccountKind,
    pk: &str,
    body: Value,
) -> Result<Response, ApiError> {
    let user_id = parse_pk(pk)?;
    if fetch_account(pool, kind, user_id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let key = kind.envelope();
    let update: AccountUpdate = take_envelope(body, key)?;
    let changes = validate_update(kind, update).map_err(|errors| errors.into_envelope(key))?;

    match update_account(pool, kind, user_id, &changes).await {
        Ok(true) => {}
        Ok(false) => return Err(ApiError::NotFound),
        Err(AccountWriteError::DuplicateUsername) => {
            return Err(FieldErrors::single("username", MSG_DUPLICATE_USERNAME).into_envelope(key));
        }
        Err(AccountWriteError::MissingProfile) => {
            return Err(FieldErrors::single("profile", MSG_NO_PROFILE).into_envelope(key));
        }
        Err(AccountWriteError::Database(err)) => return Err(ApiError::Database(err)),
    }

    if let Some(status) = changes.status {
        info!(user_id, kind = kind.group(), status, "account status changed");
    }

    let account = fetch_account(pool, kind, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(envelope(key, account)?).into_response())
}

/// `pending` only changes the log line: approval requests are deleted as rejections.
pub(super) async fn remove(
    pool: &PgPool,
    kind: AccountKind,
    pk: &str,
    pending: bool,
) -> Result<Response, ApiError> {
    let user_id = parse_pk(pk)?;
    if !delete_account(pool, kind, user_id).await? {
        return Err(ApiError::NotFound);
    }
    if pending {
        info!(
            "{} approval request with id `{user_id}` has been deleted.",
            kind.label()
        );
    } else {
        info!("User with id `{user_id}` has been deleted.");
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}
