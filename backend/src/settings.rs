//! Process configuration loaded via OrthoConfig.
//!
//! Values come from `PHONEBOOK_*` environment variables, configuration files
//! and command-line flags. They are read once at startup and never change.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::outbound::persistence::PoolConfig;

const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_ACTOR: &str = "http";

/// Settings that cannot be turned into a runnable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("PHONEBOOK_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("invalid HTTP host '{host}': {message}")]
    InvalidHost { host: String, message: String },
    #[error("max open connections must be at least 1")]
    NoConnections,
}

/// Configuration values for the phone-book service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PHONEBOOK")]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub http_host: Option<String>,
    /// Port the HTTP server listens on.
    #[ortho_config(default = 9080)]
    pub http_port: u16,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    #[ortho_config(default = 15)]
    pub max_open_connections: u32,
    /// Connections kept warm while idle.
    #[ortho_config(default = 10)]
    pub max_idle_connections: u32,
    /// Deployment name, e.g. `development` or `production`.
    pub environment: Option<String>,
    /// Name stamped into the audit columns of every write.
    pub actor: Option<String>,
    /// Directory holding `<version>_<name>.sql` seed files.
    pub seeders_dir: Option<PathBuf>,
}

impl Settings {
    /// Host to bind, defaulting to every interface.
    pub fn http_host(&self) -> &str {
        self.http_host.as_deref().unwrap_or(DEFAULT_HTTP_HOST)
    }

    /// Host and port for the HTTP listener.
    ///
    /// The host may be an IP address or a name; names are resolved when the
    /// listener binds.
    ///
    /// # Errors
    /// [`SettingsError::InvalidHost`] when the host is blank or contains
    /// whitespace.
    pub fn bind_addr(&self) -> Result<(String, u16), SettingsError> {
        let host = self.http_host();
        let message = if host.is_empty() {
            Some("host must not be blank")
        } else if host.chars().any(char::is_whitespace) {
            Some("host must not contain whitespace")
        } else {
            None
        };
        match message {
            Some(message) => Err(SettingsError::InvalidHost {
                host: host.to_owned(),
                message: message.to_owned(),
            }),
            None => Ok((host.to_owned(), self.http_port)),
        }
    }

    /// The required database connection string.
    ///
    /// # Errors
    /// [`SettingsError::MissingDatabaseUrl`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Pool configuration from the connection string and bounds.
    ///
    /// # Errors
    /// [`SettingsError::MissingDatabaseUrl`] without a connection string and
    /// [`SettingsError::NoConnections`] when the pool would be empty.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let database_url = self.database_url()?;
        if self.max_open_connections == 0 {
            return Err(SettingsError::NoConnections);
        }
        Ok(PoolConfig::new(database_url)
            .with_max_size(self.max_open_connections)
            .with_min_idle(Some(self.max_idle_connections)))
    }

    /// Deployment name.
    pub fn environment(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }

    /// Audit actor for writes made through the HTTP surface.
    pub fn actor(&self) -> &str {
        self.actor.as_deref().unwrap_or(DEFAULT_ACTOR)
    }
}
