use std::{fmt, str::FromStr};

use anyhow::bail;

pub const DEFAULT_SERVER: &str = "127.0.0.1";
pub const DEFAULT_PORT: &str = "3306";

/// Everything needed to reach one MySQL database as one user.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    server: String,
    port: String,
    database: String,
    username: String,
    password: String,
}

impl ConnectionProfile {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        server: impl Into<String>,
        port: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            port: port.into(),
            database: database.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Profile for a server on this machine listening on the default port.
    pub fn local(
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self::new(username, password, database, DEFAULT_SERVER, DEFAULT_PORT)
    }

    /// Profile for `server` listening on the default port.
    pub fn on_server(
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self::new(username, password, database, server, DEFAULT_PORT)
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SslMode {
    #[default]
    None,
    Preferred,
    Required,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SslMode::None => "None",
            SslMode::Preferred => "Preferred",
            SslMode::Required => "Required",
            SslMode::VerifyCa => "VerifyCA",
            SslMode::VerifyFull => "VerifyFull",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SslMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mode = match value.trim().to_ascii_lowercase().as_str() {
            "none" | "disabled" => SslMode::None,
            "preferred" => SslMode::Preferred,
            "required" => SslMode::Required,
            "verifyca" => SslMode::VerifyCa,
            "verifyfull" => SslMode::VerifyFull,
            other => bail!("Unknown SSL mode `{other}`."),
        };
        Ok(mode)
    }
}
