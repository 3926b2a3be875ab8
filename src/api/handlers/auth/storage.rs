//! SQL helpers for credentials, tokens and group membership.

use sqlx::{PgPool, Row};

use super::{principal::Principal, ADMIN_GROUP};

#[derive(Debug)]
pub(crate) struct Credentials {
    pub(crate) user_id: i64,
    pub(crate) password_hash: String,
    pub(crate) groups: Vec<String>,
}

/// Fetch the password hash and group names for `username`.
pub(crate) async fn lookup_credentials(
    pool: &PgPool,
    username: &str,
) -> Result<Option<Credentials>, sqlx::Error> {
    let query = r"
        SELECT
            u.id,
            u.password_hash,
            COALESCE(
                array_agg(g.name) FILTER (WHERE g.name IS NOT NULL),
                '{}'
            ) AS groups
        FROM users u
        LEFT JOIN user_groups ug ON ug.user_id = u.id
        LEFT JOIN groups g ON g.id = ug.group_id
        WHERE u.username = $1
        GROUP BY u.id, u.password_hash
    ";
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| Credentials {
        user_id: row.get("id"),
        password_hash: row.get("password_hash"),
        groups: row.get("groups"),
    }))
}

/// Store the hash of a freshly issued token, replacing any previous one.
pub(crate) async fn store_token(
    pool: &PgPool,
    user_id: i64,
    token_hash: &[u8],
    ttl_seconds: i64,
) -> Result<(), sqlx::Error> {
    let query = r"
        INSERT INTO auth_tokens (user_id, token_hash, created_at, expires_at)
        VALUES ($1, $2, NOW(), NOW() + make_interval(secs => $3))
        ON CONFLICT (user_id)
        DO UPDATE SET
            token_hash = EXCLUDED.token_hash,
            created_at = EXCLUDED.created_at,
            expires_at = EXCLUDED.expires_at
    ";
    sqlx::query(query)
        .bind(user_id)
        .bind(token_hash)
        .bind(ttl_seconds as f64)
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolve an unexpired token hash into its principal.
pub(crate) async fn lookup_token(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<Principal>, sqlx::Error> {
    let query = r"
        SELECT
            u.id,
            u.username,
            COALESCE(
                array_agg(g.name) FILTER (WHERE g.name IS NOT NULL),
                '{}'
            ) AS groups
        FROM auth_tokens t
        JOIN users u ON u.id = t.user_id
        LEFT JOIN user_groups ug ON ug.user_id = u.id
        LEFT JOIN groups g ON g.id = ug.group_id
        WHERE t.token_hash = $1 AND t.expires_at > NOW()
        GROUP BY u.id, u.username
    ";
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| Principal {
        user_id: row.get("id"),
        username: row.get("username"),
        groups: row.get("groups"),
    }))
}

pub(crate) async fn delete_token(pool: &PgPool, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert or refresh an approved account in the `admin` group.
pub(crate) async fn upsert_admin(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r"
        INSERT INTO users (username, email, password_hash, status)
        VALUES ($1, $2, $3, TRUE)
        ON CONFLICT (username)
        DO UPDATE SET email = EXCLUDED.email, password_hash = EXCLUDED.password_hash, status = TRUE
        RETURNING id
        ",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await?;
    let user_id: i64 = row.get("id");

    sqlx::query(
        r"
        INSERT INTO user_groups (user_id, group_id)
        SELECT $1, id FROM groups WHERE name = $2
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(user_id)
    .bind(ADMIN_GROUP)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(user_id)
}
