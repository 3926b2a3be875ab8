use crate::cli::{
    actions::{create_admin, migrate, server, Action},
    commands::{admin, database, server as server_args, CMD_CREATE_ADMIN, CMD_MIGRATE, CMD_SERVER},
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

/// Map parsed arguments to an [`Action`]. No subcommand means `server`.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let (name, sub_m) = match matches.subcommand() {
        Some((name, sub_m)) => (name, sub_m),
        None => (CMD_SERVER, matches),
    };

    let globals = global_args(sub_m)?;

    match name {
        CMD_SERVER => Ok(Action::Server(server::Args {
            port: sub_m
                .get_one::<u16>(server_args::ARG_PORT)
                .copied()
                .unwrap_or(8080),
            token_ttl_seconds: sub_m
                .get_one::<i64>(server_args::ARG_TOKEN_TTL)
                .copied()
                .unwrap_or(86_400),
            globals,
        })),
        CMD_MIGRATE => Ok(Action::Migrate(migrate::Args { globals })),
        CMD_CREATE_ADMIN => Ok(Action::CreateAdmin(create_admin::Args {
            globals,
            username: required(sub_m, admin::ARG_USERNAME)?,
            email: required(sub_m, admin::ARG_EMAIL)?,
            password: SecretString::from(required(sub_m, admin::ARG_PASSWORD)?),
        })),
        other => Err(anyhow!("unknown subcommand: {other}")),
    }
}

fn global_args(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let dsn = required(matches, database::ARG_DSN)?;
    let mut globals = GlobalArgs::new(dsn);
    globals.set_credentials(
        matches.get_one::<String>(database::ARG_DB_USERNAME).cloned(),
        matches
            .get_one::<String>(database::ARG_DB_PASSWORD)
            .cloned()
            .map(SecretString::from),
    );
    Ok(globals)
}

fn required(matches: &clap::ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    const DSN: &str = "postgres://localhost:5432/hospital";

    fn dispatch(args: &[&str]) -> Result<Action> {
        temp_env::with_vars(
            [
                ("HOSPITAL_ADMIN_DSN", None::<&str>),
                ("HOSPITAL_ADMIN_PORT", None),
                ("HOSPITAL_ADMIN_DB_USERNAME", None),
                ("HOSPITAL_ADMIN_DB_PASSWORD", None),
                ("HOSPITAL_ADMIN_TOKEN_TTL_SECONDS", None),
                ("HOSPITAL_ADMIN_ADMIN_USERNAME", None),
                ("HOSPITAL_ADMIN_ADMIN_EMAIL", None),
                ("HOSPITAL_ADMIN_ADMIN_PASSWORD", None),
            ],
            || handler(&commands::new().get_matches_from(args)),
        )
    }

    #[test]
    fn no_subcommand_runs_the_server() -> Result<()> {
        let action = dispatch(&["hospital-admin", "--dsn", DSN, "--port", "9000"])?;
        let Action::Server(args) = action else {
            panic!("expected server action");
        };
        assert_eq!(args.port, 9000);
        assert_eq!(args.token_ttl_seconds, 86_400);
        assert_eq!(args.globals.dsn, DSN);
        Ok(())
    }

    #[test]
    fn missing_dsn_is_an_error() {
        let err = dispatch(&["hospital-admin"]).err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("missing required argument: --dsn"));
    }

    #[test]
    fn migrate_carries_credentials() -> Result<()> {
        let action = dispatch(&[
            "hospital-admin",
            "migrate",
            "--dsn",
            DSN,
            "--db-username",
            "owner",
        ])?;
        let Action::Migrate(args) = action else {
            panic!("expected migrate action");
        };
        assert_eq!(args.globals.db_username.as_deref(), Some("owner"));
        assert_eq!(
            args.globals.connection_string()?,
            "postgres://owner@localhost:5432/hospital"
        );
        Ok(())
    }

    #[test]
    fn create_admin_collects_account_fields() -> Result<()> {
        let action = dispatch(&[
            "hospital-admin",
            "--dsn",
            DSN,
            "create-admin",
            "--username",
            "root",
            "--email",
            "root@hospital.test",
            "--password",
            "correct-horse",
        ])?;
        let Action::CreateAdmin(args) = action else {
            panic!("expected create-admin action");
        };
        assert_eq!(args.username, "root");
        assert_eq!(args.email, "root@hospital.test");
        Ok(())
    }
}
