use clap::{Arg, Command};

pub const ARG_USERNAME: &str = "username";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";

#[must_use]
pub fn subcommand() -> Command {
    Command::new("create-admin")
        .about("Create an admin account, or reset the password of an existing one")
        .arg(
            Arg::new(ARG_USERNAME)
                .short('u')
                .long("username")
                .help("Admin username")
                .env("HOSPITAL_ADMIN_ADMIN_USERNAME")
                .required(true),
        )
        .arg(
            Arg::new(ARG_EMAIL)
                .short('e')
                .long("email")
                .help("Admin email address")
                .env("HOSPITAL_ADMIN_ADMIN_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long("password")
                .help("Admin password, at least 8 characters")
                .env("HOSPITAL_ADMIN_ADMIN_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}
