//! SQL storage helpers for doctor and patient accounts.
//!
//! Every lookup joins through `user_groups`, so a doctor endpoint never sees a
//! patient (or admin) account and vice versa.

use sqlx::{postgres::PgRow, PgPool, Postgres, Row, Transaction};

use super::{
    types::{
        AccountResponse, DoctorProfileResponse, PatientProfileResponse, ProfileResponse,
        UserResponse,
    },
    validate::{AccountChanges, NewProfile, NewUser, ProfileChanges},
    AccountKind,
};
use crate::api::handlers::{error::is_unique_violation, fields::Department};

/// Storage failures that map to a client error instead of a `500`.
#[derive(Debug)]
pub(crate) enum AccountWriteError {
    DuplicateUsername,
    /// A `profile` change was sent for an account that has no profile row.
    MissingProfile,
    Database(sqlx::Error),
}

impl From<sqlx::Error> for AccountWriteError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            Self::DuplicateUsername
        } else {
            Self::Database(err)
        }
    }
}

fn profile_columns(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::Doctor => "p.id AS profile_id, p.department, p.address, p.mobile",
        AccountKind::Patient => "p.id AS profile_id, p.age::text AS age, p.address, p.mobile",
    }
}

fn profile_table(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::Doctor => "doctors",
        AccountKind::Patient => "patients",
    }
}

fn select_accounts(kind: AccountKind, filter: &str) -> String {
    format!(
        r#"
        SELECT
            u.id,
            u.username,
            u.email,
            u.first_name,
            u.last_name,
            u.status,
            to_char(u.date_joined AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS date_joined,
            {columns}
        FROM users u
        JOIN user_groups ug ON ug.user_id = u.id
        JOIN groups g ON g.id = ug.group_id AND g.name = $1
        LEFT JOIN {table} p ON p.user_id = u.id
        WHERE {filter}
        ORDER BY u.id
        "#,
        columns = profile_columns(kind),
        table = profile_table(kind),
    )
}

fn profile_from_row(kind: AccountKind, row: &PgRow) -> Option<ProfileResponse> {
    let id: Option<i64> = row.get("profile_id");
    let id = id?;
    let user: i64 = row.get("id");
    let address: String = row.get("address");
    let mobile: String = row.get("mobile");
    Some(match kind {
        AccountKind::Doctor => {
            let department: String = row.get("department");
            ProfileResponse::Doctor(DoctorProfileResponse {
                id,
                user,
                department: Department::from_code(&department).unwrap_or_default(),
                address,
                mobile,
            })
        }
        AccountKind::Patient => ProfileResponse::Patient(PatientProfileResponse {
            id,
            user,
            age: row.get("age"),
            address,
            mobile,
        }),
    })
}

fn account_from_row(kind: AccountKind, row: &PgRow) -> AccountResponse {
    AccountResponse {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        status: row.get("status"),
        date_joined: row.get("date_joined"),
        profile: profile_from_row(kind, row),
    }
}

/// List accounts of `kind` whose approval flag equals `approved`.
pub(crate) async fn fetch_accounts(
    pool: &PgPool,
    kind: AccountKind,
    approved: bool,
) -> Result<Vec<AccountResponse>, sqlx::Error> {
    let query = select_accounts(kind, "u.status = $2");
    let rows = sqlx::query(&query)
        .bind(kind.group())
        .bind(approved)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(|row| account_from_row(kind, row)).collect())
}

/// Fetch one account of `kind` regardless of its approval flag.
pub(crate) async fn fetch_account(
    pool: &PgPool,
    kind: AccountKind,
    user_id: i64,
) -> Result<Option<AccountResponse>, sqlx::Error> {
    let query = select_accounts(kind, "u.id = $2");
    let row = sqlx::query(&query)
        .bind(kind.group())
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| account_from_row(kind, &row)))
}

/// Create an approved user of `kind` and its profile in one transaction.
pub(crate) async fn register_account(
    pool: &PgPool,
    kind: AccountKind,
    user: &NewUser,
    password_hash: &str,
    profile: &NewProfile,
) -> Result<(UserResponse, ProfileResponse), AccountWriteError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r"
        INSERT INTO users (username, email, first_name, last_name, password_hash, status)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        RETURNING id, status
        ",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await?;
    let user_id: i64 = row.get("id");
    let status: bool = row.get("status");

    sqlx::query(
        r"
        INSERT INTO user_groups (user_id, group_id)
        SELECT $1, id FROM groups WHERE name = $2
        ",
    )
    .bind(user_id)
    .bind(kind.group())
    .execute(&mut *tx)
    .await?;

    let profile = insert_profile(&mut tx, user_id, profile).await?;

    tx.commit().await?;

    Ok((
        UserResponse {
            id: user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            status,
        },
        profile,
    ))
}

async fn insert_profile(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    profile: &NewProfile,
) -> Result<ProfileResponse, sqlx::Error> {
    match profile {
        NewProfile::Doctor {
            department,
            address,
            mobile,
        } => {
            let row = sqlx::query(
                r"
                INSERT INTO doctors (user_id, department, address, mobile)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                ",
            )
            .bind(user_id)
            .bind(department.code())
            .bind(address)
            .bind(mobile)
            .fetch_one(&mut **tx)
            .await?;
            Ok(ProfileResponse::Doctor(DoctorProfileResponse {
                id: row.get("id"),
                user: user_id,
                department: *department,
                address: address.clone(),
                mobile: mobile.clone(),
            }))
        }
        NewProfile::Patient {
            age,
            address,
            mobile,
        } => {
            let row = sqlx::query(
                r"
                INSERT INTO patients (user_id, age, address, mobile)
                VALUES ($1, $2::numeric, $3, $4)
                RETURNING id, age::text AS age
                ",
            )
            .bind(user_id)
            .bind(age.to_string())
            .bind(address)
            .bind(mobile)
            .fetch_one(&mut **tx)
            .await?;
            Ok(ProfileResponse::Patient(PatientProfileResponse {
                id: row.get("id"),
                user: user_id,
                age: row.get("age"),
                address: address.clone(),
                mobile: mobile.clone(),
            }))
        }
    }
}

/// Apply a partial update. Returns `false` when no account of `kind` has `user_id`.
/// Nothing is written when profile changes target a missing profile row.
pub(crate) async fn update_account(
    pool: &PgPool,
    kind: AccountKind,
    user_id: i64,
    changes: &AccountChanges,
) -> Result<bool, AccountWriteError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r"
        UPDATE users u
        SET
            username = COALESCE($3, u.username),
            email = COALESCE($4, u.email),
            first_name = COALESCE($5, u.first_name),
            last_name = COALESCE($6, u.last_name),
            status = COALESCE($7, u.status)
        FROM user_groups ug
        JOIN groups g ON g.id = ug.group_id
        WHERE u.id = $1 AND ug.user_id = u.id AND g.name = $2
        RETURNING u.id
        ",
    )
    .bind(user_id)
    .bind(kind.group())
    .bind(changes.username.as_deref())
    .bind(changes.email.as_deref())
    .bind(changes.first_name.as_deref())
    .bind(changes.last_name.as_deref())
    .bind(changes.status)
    .fetch_optional(&mut *tx)
    .await?;

    if row.is_none() {
        return Ok(false);
    }

    if !changes.profile.is_empty()
        && !update_profile(&mut tx, kind, user_id, &changes.profile).await?
    {
        return Err(AccountWriteError::MissingProfile);
    }

    tx.commit().await?;

    Ok(true)
}

async fn update_profile(
    tx: &mut Transaction<'_, Postgres>,
    kind: AccountKind,
    user_id: i64,
    changes: &ProfileChanges,
) -> Result<bool, sqlx::Error> {
    let result = match kind {
        AccountKind::Doctor => {
            sqlx::query(
                r"
                UPDATE doctors
                SET
                    department = COALESCE($2, department),
                    address = COALESCE($3, address),
                    mobile = COALESCE($4, mobile)
                WHERE user_id = $1
                ",
            )
            .bind(user_id)
            .bind(changes.department.map(Department::code))
            .bind(changes.address.as_deref())
            .bind(changes.mobile.as_deref())
            .execute(&mut **tx)
            .await?
        }
        AccountKind::Patient => {
            sqlx::query(
                r"
                UPDATE patients
                SET
                    age = COALESCE($2::numeric, age),
                    address = COALESCE($3, address),
                    mobile = COALESCE($4, mobile)
                WHERE user_id = $1
                ",
            )
            .bind(user_id)
            .bind(changes.age.map(|age| age.to_string()))
            .bind(changes.address.as_deref())
            .bind(changes.mobile.as_deref())
            .execute(&mut **tx)
            .await?
        }
    };
    Ok(result.rows_affected() > 0)
}

/// Delete an account of `kind`. Profiles, histories and tokens cascade;
/// appointments keep their row with the doctor reference cleared.
pub(crate) async fn delete_account(
    pool: &PgPool,
    kind: AccountKind,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r"
        DELETE FROM users u
        USING user_groups ug, groups g
        WHERE u.id = $1 AND ug.user_id = u.id AND g.id = ug.group_id AND g.name = $2
        ",
    )
    .bind(user_id)
    .bind(kind.group())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_accounts_scopes_by_group_and_profile() {
        let doctors = select_accounts(AccountKind::Doctor, "u.status = $2");
        assert!(doctors.contains("LEFT JOIN doctors p"));
        assert!(doctors.contains("p.department"));
        assert!(doctors.contains("g.name = $1"));

        let patients = select_accounts(AccountKind::Patient, "u.id = $2");
        assert!(patients.contains("LEFT JOIN patients p"));
        assert!(patients.contains("p.age::text AS age"));
        assert!(patients.contains("WHERE u.id = $2"));
    }
}
