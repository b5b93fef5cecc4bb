//! SQL Server connection configuration.

use std::time::Duration;

/// Default SQL Server TCP port.
pub const DEFAULT_PORT: u16 = 1433;

/// How the exporter authenticates against the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// SQL Server login with username and password
    #[default]
    SqlServer,
    /// Integrated (operating system) authentication
    Integrated,
}

/// Configuration for a SQL Server connection.
///
/// # Security
/// This struct does NOT store passwords. Credentials are passed separately as
/// [`Credentials`](crate::security::Credentials) and never logged.
///
/// # Example
/// ```rust
/// use dataexport_core::adapters::ConnectionConfig;
///
/// let config = ConnectionConfig::new("db01".to_string())
///     .with_port(1444)
///     .with_database("sales".to_string())
///     .with_username("exporter".to_string());
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.to_string(), "ConnectionConfig(db01:1444/sales)");
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server host, optionally `host\instance` for a named instance
    pub host: String,
    /// TCP port (ignored for named instances, which are resolved by SQL Browser)
    pub port: u16,
    /// Initial catalog
    pub database: Option<String>,
    /// Login name (password handled separately)
    pub username: Option<String>,
    /// Authentication mode
    pub auth: AuthMode,
    /// Accept the server certificate without validation
    pub trust_cert: bool,
    /// Connection timeout duration
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            database: None,
            username: None,
            auth: AuthMode::SqlServer,
            trust_cert: false,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConnectionConfig({}:{}{})",
            self.host,
            self.port,
            self.database
                .as_ref()
                .map_or_else(String::new, |db| format!("/{}", db))
        )
        // Intentionally omit username and never include credentials
    }
}

impl ConnectionConfig {
    /// Creates a new connection config with default port and timeout.
    pub fn new(host: String) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    /// Builder method to set port.
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder method to set database.
    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    /// Builder method to set username.
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Builder method to select the authentication mode.
    pub const fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    /// Builder method to trust the server certificate.
    pub const fn with_trust_cert(mut self, trust_cert: bool) -> Self {
        self.trust_cert = trust_cert;
        self
    }

    /// Builder method to set the connection timeout.
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Splits `host\instance` into host and instance name.
    pub fn host_and_instance(&self) -> (&str, Option<&str>) {
        match self.host.split_once('\\') {
            Some((host, instance)) if !instance.is_empty() => (host, Some(instance)),
            Some((host, _)) => (host, None),
            None => (self.host.as_str(), None),
        }
    }

    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns error if the host is missing, the port is zero, a SQL Server
    /// login has no username, or the timeout is zero.
    pub fn validate(&self) -> crate::Result<()> {
        if self.host_and_instance().0.trim().is_empty() {
            return Err(crate::error::DataExportError::configuration(
                "host cannot be empty",
            ));
        }

        if self.port == 0 {
            return Err(crate::error::DataExportError::configuration(
                "port must be greater than 0",
            ));
        }

        if self.auth == AuthMode::SqlServer
            && self.username.as_deref().is_none_or(|u| u.trim().is_empty())
        {
            return Err(crate::error::DataExportError::configuration(
                "a username is required unless integrated authentication is used",
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(crate::error::DataExportError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}
