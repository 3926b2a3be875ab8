//! Authenticated principal extraction and the admin-only gate.
//!
//! Flow Overview: read the `Authorization` header, resolve the token hash to a
//! user, then require membership of the `admin` group before the request
//! reaches any handler. The principal is stored as a request extension.

use axum::{
    extract::{Extension, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use tracing::{debug, warn};

use super::{storage::lookup_token, utils, ADMIN_GROUP};
use crate::api::handlers::error::ApiError;

const MSG_NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
const MSG_INVALID_TOKEN: &str = "Invalid token.";
const MSG_FORBIDDEN: &str = "You do not have permission to perform this action.";

/// Authenticated user context derived from the API token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub groups: Vec<String>,
}

impl Principal {
    /// The single permission predicate of the admin API.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.groups.iter().any(|group| group == ADMIN_GROUP)
    }
}

/// Resolve the token header into a principal.
///
/// # Errors
/// `401` for a missing, unknown or expired token; `500` on database failure.
pub async fn authenticate(headers: &HeaderMap, pool: &PgPool) -> Result<Principal, ApiError> {
    let Some(token) = utils::extract_token(headers) else {
        return Err(ApiError::Unauthorized(MSG_NOT_AUTHENTICATED));
    };
    let token_hash = utils::hash_token(&token);
    match lookup_token(pool, &token_hash).await? {
        Some(principal) => Ok(principal),
        None => Err(ApiError::Unauthorized(MSG_INVALID_TOKEN)),
    }
}

/// # Errors
/// `403` when the principal is not in the `admin` group.
pub fn authorize(principal: &Principal) -> Result<(), ApiError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(MSG_FORBIDDEN))
    }
}

/// Middleware guarding every admin route.
///
/// # Errors
/// See [`authenticate`] and [`authorize`].
pub async fn require_admin(
    Extension(pool): Extension<PgPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = authenticate(request.headers(), &pool).await?;
    if let Err(err) = authorize(&principal) {
        warn!(
            user_id = principal.user_id,
            username = %principal.username,
            "non-admin attempted admin route"
        );
        return Err(err);
    }
    debug!(user_id = principal.user_id, "admin authenticated");
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
