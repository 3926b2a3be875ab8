//! Handler error type and its HTTP mapping.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Missing, malformed, unknown or expired token.
    Unauthorized(&'static str),
    /// Authenticated but not allowed.
    Forbidden(&'static str),
    /// Request-level problem that is not tied to a payload field.
    BadRequest(&'static str),
    /// Field errors, already wrapped in their envelope key(s).
    Validation(Value),
    NotFound,
    /// The history exists but is owned by a different patient.
    NotOwned(i64),
    Database(sqlx::Error),
    Internal(anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl IntoResponse for ApiError {
    /// Database and internal errors are logged server-side and surfaced as `500`
    /// without details.
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized(detail) => {
                let mut response =
                    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response();
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
                response
            }
            Self::Forbidden(detail) => {
                (StatusCode::FORBIDDEN, Json(json!({ "detail": detail }))).into_response()
            }
            Self::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
            }
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Self::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
            }
            Self::NotOwned(hid) => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": format!("This history id `{hid}` does not belong to the user")
                })),
            )
                .into_response(),
            Self::Database(err) => {
                error!("Database error: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Internal(err) => {
                error!("Internal error: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn has_code(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|c| c.as_ref() == code),
        _ => false,
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_code(err, "23505")
}

/// Name of the violated constraint when `err` is a foreign-key violation.
pub(crate) fn foreign_key_violation(err: &sqlx::Error) -> Option<&str> {
    if !has_code(err, "23503") {
        return None;
    }
    match err {
        sqlx::Error::Database(db_err) => Some(db_err.constraint().unwrap_or_default()),
        _ => None,
    }
}

/// Database error with a given SQLSTATE and constraint name.
#[cfg(test)]
pub(crate) fn constraint_error(code: &'static str, constraint: &'static str) -> sqlx::Error {
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{borrow::Cow, error::Error as StdError, fmt};

    #[derive(Debug)]
    struct ConstraintError {
        code: &'static str,
        constraint: &'static str,
    }

    impl fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "violates constraint \"{}\"", self.constraint)
        }
    }

    impl StdError for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.code {
                "23505" => ErrorKind::UniqueViolation,
                "23503" => ErrorKind::ForeignKeyViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    sqlx::Error::Database(Box::new(ConstraintError { code, constraint }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    }

    #[tokio::test]
    async fn not_owned_reports_history_id() {
        let response = ApiError::NotOwned(42).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(
            body["message"],
            "This history id `42` does not belong to the user"
        );
    }

    #[tokio::test]
    async fn unauthorized_sets_challenge_header() {
        let response = ApiError::Unauthorized("Invalid token.").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Token"))
        );
    }

    #[tokio::test]
    async fn validation_passes_envelope_through() {
        let errors = json!({ "appointments": { "doctor": ["Invalid pk \"9\" - object does not exist."] } });
        let response = ApiError::Validation(errors.clone()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, errors);
    }

    #[test]
    fn database_errors_are_not_unique_violations_by_default() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(foreign_key_violation(&sqlx::Error::RowNotFound).is_none());
    }

    #[test]
    fn constraint_codes_are_told_apart() {
        let unique = constraint_error("23505", "users_username_key");
        assert!(is_unique_violation(&unique));
        assert!(foreign_key_violation(&unique).is_none());

        let foreign = constraint_error("23503", "appointments_doctor_id_fkey");
        assert!(!is_unique_violation(&foreign));
        assert_eq!(
            foreign_key_violation(&foreign),
            Some("appointments_doctor_id_fkey")
        );
    }
}
