use axum::{
    extract::{Extension, Json},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    principal::authenticate,
    storage::{delete_token, lookup_credentials, store_token},
    types::{LoginRequest, MessageResponse, TokenResponse},
    utils::{generate_token, hash_token, verify_password},
    AuthConfig, ADMIN_GROUP,
};
use crate::api::handlers::{
    error::ApiError,
    validation::{payload_body, FieldErrors, MSG_BLANK, MSG_REQUIRED, NON_FIELD_ERRORS},
};

const MSG_BAD_CREDENTIALS: &str = "Unable to log in with provided credentials.";
const MSG_NOT_ADMIN: &str = "You are not authorised to login as an admin";

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued.", body = TokenResponse),
        (status = 400, description = "Missing fields or bad credentials."),
        (status = 403, description = "Valid credentials but not an admin.", body = MessageResponse),
    ),
    tag = "auth"
)]
/// Exchange admin credentials for an API token.
///
/// Each successful login replaces the previous token of the user.
pub async fn login(
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let request = login_request(payload_body(payload))?;

    let mut errors = FieldErrors::new();
    let username = present(&mut errors, "username", request.username);
    let password = present(&mut errors, "password", request.password);
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::Validation(serde_json::json!(errors)));
    };

    let Some(credentials) = lookup_credentials(&pool, &username).await? else {
        warn!(username, "login attempt for unknown user");
        return Err(bad_credentials());
    };
    if !verify_password(&password, &credentials.password_hash) {
        warn!(user_id = credentials.user_id, "login attempt with wrong password");
        return Err(bad_credentials());
    }
    if !credentials.groups.iter().any(|group| group == ADMIN_GROUP) {
        warn!(user_id = credentials.user_id, "non-admin login refused");
        return Ok((
            StatusCode::FORBIDDEN,
            Json(MessageResponse::new(MSG_NOT_ADMIN)),
        )
            .into_response());
    }

    let token = generate_token().map_err(ApiError::Internal)?;
    store_token(
        &pool,
        credentials.user_id,
        &hash_token(&token),
        config.token_ttl_seconds(),
    )
    .await?;

    info!(user_id = credentials.user_id, "admin logged in");

    Ok((StatusCode::OK, Json(TokenResponse { token })).into_response())
}

#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses(
        (status = 204, description = "Token revoked."),
        (status = 401, description = "Missing or invalid token."),
    ),
    security(("token" = [])),
    tag = "auth"
)]
/// Revoke the presented token.
pub async fn logout(headers: HeaderMap, pool: Extension<PgPool>) -> Result<Response, ApiError> {
    let principal = authenticate(&headers, &pool).await?;
    delete_token(&pool, principal.user_id).await?;
    info!(user_id = principal.user_id, "admin logged out");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// A missing body lists both fields as required; a body of the wrong shape is
/// reported under `non_field_errors`.
fn login_request(body: Value) -> Result<LoginRequest, ApiError> {
    if body.is_null() {
        return Ok(LoginRequest::default());
    }
    serde_json::from_value(body).map_err(|err| {
        ApiError::Validation(serde_json::json!(FieldErrors::single(
            NON_FIELD_ERRORS,
            err.to_string()
        )))
    })
}

fn present(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    match value {
        None => {
            errors.add(field, MSG_REQUIRED);
            None
        }
        Some(value) if value.is_empty() => {
            errors.add(field, MSG_BLANK);
            None
        }
        Some(value) => Some(value),
    }
}

fn bad_credentials() -> ApiError {
    ApiError::Validation(serde_json::json!(FieldErrors::single(
        NON_FIELD_ERRORS,
        MSG_BAD_CREDENTIALS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_flags_missing_and_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(present(&mut errors, "username", None), None);
        assert_eq!(present(&mut errors, "password", Some(String::new())), None);
        assert_eq!(
            present(&mut errors, "other", Some("x".to_string())),
            Some("x".to_string())
        );
        assert_eq!(errors.messages("username"), [MSG_REQUIRED.to_string()]);
        assert_eq!(errors.messages("password"), [MSG_BLANK.to_string()]);
    }

    #[test]
    fn login_request_reports_type_errors() {
        let Err(ApiError::Validation(value)) =
            login_request(serde_json::json!({ "username": 42, "password": "secret-pass" }))
        else {
            panic!("expected validation error");
        };
        assert!(value[NON_FIELD_ERRORS][0].is_string());
        assert!(value.get("username").is_none());
        assert!(value.get("password").is_none());
    }

    #[test]
    fn login_request_without_body_is_empty() -> Result<(), ApiError> {
        let request = login_request(Value::Null)?;
        assert!(request.username.is_none() && request.password.is_none());
        Ok(())
    }

    #[test]
    fn bad_credentials_uses_non_field_errors() {
        let ApiError::Validation(value) = bad_credentials() else {
            panic!("expected validation error");
        };
        assert_eq!(value[NON_FIELD_ERRORS][0], MSG_BAD_CREDENTIALS);
    }
}
