use clap::{Arg, Command};

pub const ARG_PORT: &str = "port";
pub const ARG_TOKEN_TTL: &str = "token-ttl-seconds";

/// Server arguments. Global so `hospital-admin --port 80` works without the
/// `server` subcommand.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("HOSPITAL_ADMIN_PORT")
                .global(true)
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL)
                .long("token-ttl-seconds")
                .help("Admin API token TTL in seconds")
                .env("HOSPITAL_ADMIN_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .global(true)
                .value_parser(clap::value_parser!(i64).range(60..)),
        )
}

#[must_use]
pub fn subcommand() -> Command {
    Command::new("server").about("Serve the admin API (default)")
}
