use crate::{api, cli::globals::GlobalArgs, db};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

/// Create or reset an admin account.
/// # Errors
/// Returns an error if the input is invalid or the database write fails.
pub async fn execute(args: Args) -> Result<()> {
    let pool = db::connect(&args.globals.connection_string()?).await?;

    let user_id = api::bootstrap_admin(
        &pool,
        &args.username,
        &args.email,
        args.password.expose_secret(),
    )
    .await?;
    pool.close().await;

    println!("admin `{}` ready (id {user_id})", args.username.trim());
    Ok(())
}
