//! Database pool construction and schema bootstrap.
//!
//! The schema ships inside the binary (`sql/schema.sql`) and is applied
//! statement by statement, so `migrate` and the integration tests share one
//! source of truth.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{debug, info_span, Instrument};

pub const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// Open a Postgres pool for the API.
///
/// # Errors
/// Returns an error if no connection can be established.
pub async fn connect(dsn: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn)
        .await
        .context("Failed to connect to database")
}

/// Apply the embedded schema. Every statement is idempotent.
///
/// # Errors
/// Returns an error naming the first statement that failed.
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
    let statements = split_sql_statements(SCHEMA_SQL);
    let span = info_span!("db.migrate", db.system = "postgresql", statements = statements.len());

    async {
        let mut tx = pool.begin().await.context("failed to open migration transaction")?;
        for (index, statement) in statements.iter().enumerate() {
            debug!(index, "applying schema statement");
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
        }
        tx.commit().await.context("failed to commit schema")?;
        Ok(())
    }
    .instrument(span)
    .await
}

/// Splits a schema file into individual statements, dropping `--` comment lines.
/// Statements end with `;` at the end of a line and never nest semicolons.
#[must_use]
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_skips_comments_and_blank_lines() {
        let sql = "-- header\nCREATE TABLE a (id INT);\n\n-- note\nINSERT INTO a VALUES (1);\n";
        let statements = split_sql_statements(sql);
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE a (id INT);".to_string(),
                "INSERT INTO a VALUES (1);".to_string()
            ]
        );
    }

    #[test]
    fn split_keeps_multiline_statements_together() {
        let sql = "CREATE TABLE a (\n    id INT,\n    name TEXT\n);\n";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("name TEXT"));
    }

    #[test]
    fn split_returns_trailing_statement_without_semicolon() {
        let statements = split_sql_statements("SELECT 1;\nSELECT 2");
        assert_eq!(statements, vec!["SELECT 1;".to_string(), "SELECT 2".to_string()]);
    }

    #[test]
    fn embedded_schema_creates_every_table() {
        let statements = split_sql_statements(SCHEMA_SQL);
        for table in [
            "groups",
            "users",
            "user_groups",
            "auth_tokens",
            "doctors",
            "patients",
            "patient_histories",
            "appointments",
            "patient_costs",
        ] {
            let needle = format!("CREATE TABLE IF NOT EXISTS {table} (");
            assert!(
                statements.iter().any(|s| s.starts_with(&needle)),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn appointment_doctor_is_cleared_not_cascaded() {
        let appointments = split_sql_statements(SCHEMA_SQL)
            .into_iter()
            .find(|s| s.starts_with("CREATE TABLE IF NOT EXISTS appointments"))
            .unwrap_or_default();
        assert!(appointments.contains("REFERENCES doctors (id) ON DELETE SET NULL"));
    }
}
