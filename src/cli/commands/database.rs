use clap::{Arg, Command};

pub const ARG_DSN: &str = "dsn";
pub const ARG_DB_USERNAME: &str = "db-username";
pub const ARG_DB_PASSWORD: &str = "db-password";

/// Connection arguments shared by every subcommand.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .long_help(
                    "Database connection string, example: postgres://localhost:5432/hospital. \
                     --db-username/--db-password override the credentials in the DSN.",
                )
                .env("HOSPITAL_ADMIN_DSN")
                .global(true),
        )
        .arg(
            Arg::new(ARG_DB_USERNAME)
                .long("db-username")
                .help("Database username, injected into the DSN")
                .env("HOSPITAL_ADMIN_DB_USERNAME")
                .global(true),
        )
        .arg(
            Arg::new(ARG_DB_PASSWORD)
                .long("db-password")
                .help("Database password, injected into the DSN")
                .env("HOSPITAL_ADMIN_DB_PASSWORD")
                .hide_env_values(true)
                .global(true),
        )
}
