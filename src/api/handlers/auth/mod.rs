//! Admin authentication and the admin-only permission gate.
//!
//! Flow Overview:
//! 1) `POST /api/admin/login` checks username/password (Argon2id) and group
//!    membership, then issues a random token. Only its SHA-256 hash is stored.
//! 2) Every other `/api/admin` route runs behind [`principal::require_admin`],
//!    which resolves the `Authorization` header into a [`principal::Principal`]
//!    and rejects callers outside the `admin` group.

pub mod login;
pub mod principal;
pub(crate) mod storage;
pub mod types;
pub(crate) mod utils;

pub use self::principal::Principal;

use anyhow::{anyhow, Context, Result};
use sqlx::PgPool;
use tracing::info;

pub const ADMIN_GROUP: &str = "admin";

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60 * 24;

/// Token settings for the admin API.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_ttl_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub const fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }
}

/// Create (or promote) an admin account. Used by the `create-admin` command.
///
/// The account is approved and added to the `admin` group. An existing user
/// with the same username keeps its data but gets the new password.
///
/// # Errors
/// Returns an error if the input is invalid or the database write fails.
pub async fn bootstrap_admin(
    pool: &PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i64> {
    let username = username.trim();
    if !super::validation::valid_username(username) {
        return Err(anyhow!("invalid username: {username}"));
    }
    if !super::validation::valid_email(email.trim()) {
        return Err(anyhow!("invalid email: {email}"));
    }
    if password.chars().count() < utils::PASSWORD_MIN_LEN {
        return Err(anyhow!(
            "password must be at least {} characters",
            utils::PASSWORD_MIN_LEN
        ));
    }

    let password_hash = utils::hash_password(password)?;
    let user_id = storage::upsert_admin(pool, username, email.trim(), &password_hash)
        .await
        .context("failed to store admin account")?;

    info!(user_id, username, "admin account ready");

    Ok(user_id)
}
