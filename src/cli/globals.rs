use anyhow::{anyhow, Result};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Database settings shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub dsn: String,
    pub db_username: Option<String>,
    pub db_password: Option<SecretString>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(dsn: String) -> Self {
        Self {
            dsn,
            db_username: None,
            db_password: None,
        }
    }

    pub fn set_credentials(&mut self, username: Option<String>, password: Option<SecretString>) {
        self.db_username = username;
        self.db_password = password;
    }

    /// The DSN with `--db-username`/`--db-password` injected.
    ///
    /// # Errors
    /// Returns an error if the DSN is not a URL or cannot carry credentials.
    pub fn connection_string(&self) -> Result<String> {
        if self.db_username.is_none() && self.db_password.is_none() {
            return Ok(self.dsn.clone());
        }

        let mut dsn = Url::parse(&self.dsn)?;

        if let Some(username) = &self.db_username {
            dsn.set_username(username)
                .map_err(|()| anyhow!("Error setting username"))?;
        }

        if let Some(password) = &self.db_password {
            dsn.set_password(Some(password.expose_secret()))
                .map_err(|()| anyhow!("Error setting password"))?;
        }

        Ok(dsn.to_string())
    }

    /// The DSN with any password replaced, for logs.
    #[must_use]
    pub fn redacted_dsn(&self) -> String {
        match Url::parse(&self.dsn) {
            Ok(mut parsed) => {
                if parsed.password().is_some() || self.db_password.is_some() {
                    let _ = parsed.set_password(Some("REDACTED"));
                }
                if let Some(username) = &self.db_username {
                    let _ = parsed.set_username(username);
                }
                parsed.to_string()
            }
            Err(_) => "invalid-dsn".to_string(),
        }
    }
}
