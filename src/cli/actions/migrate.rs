use crate::{cli::globals::GlobalArgs, db};
use anyhow::Result;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

/// Apply the embedded schema.
/// # Errors
/// Returns an error if the database is unreachable or a statement fails.
pub async fn execute(args: Args) -> Result<()> {
    info!("Migrating {}", args.globals.redacted_dsn());

    let pool = db::connect(&args.globals.connection_string()?).await?;
    db::apply_schema(&pool).await?;
    pool.close().await;

    info!("Schema is up to date");
    Ok(())
}
