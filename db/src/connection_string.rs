use anyhow::{anyhow, bail};
use toolbelt_core::{
    ConnectionProfile, SslMode,
    profiles::{DEFAULT_PORT, DEFAULT_SERVER},
};

use crate::Result;

/// Renders the `Server=..;Port=..;SslMode=..;Database=..;Uid=..;Pwd=..;` form.
pub fn connection_string(profile: &ConnectionProfile, ssl_mode: SslMode) -> String {
    format!(
        "Server={};Port={};SslMode={};Database={};Uid={};Pwd={};",
        profile.server(),
        profile.port(),
        ssl_mode,
        profile.database(),
        profile.username(),
        profile.password(),
    )
}

pub fn parse_connection_string(text: &str) -> Result<(ConnectionProfile, SslMode)> {
    let mut server = None;
    let mut port = None;
    let mut ssl_mode = SslMode::None;
    let mut database = None;
    let mut username = None;
    let mut password = String::new();

    for pair in text.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Malformed connection string segment `{pair}`."))?;
        let value = value.trim().to_string();
        match normalize_key(key).as_str() {
            "server" | "host" | "datasource" | "address" => server = Some(value),
            "port" => port = Some(value),
            "sslmode" => ssl_mode = value.parse()?,
            "database" | "initialcatalog" => database = Some(value),
            "uid" | "userid" | "user" | "username" => username = Some(value),
            "pwd" | "password" => password = value,
            other => tracing::debug!("Ignoring connection string key `{other}`."),
        }
    }

    let Some(database) = database else {
        bail!("Connection string is missing `Database`.");
    };
    let Some(username) = username else {
        bail!("Connection string is missing `Uid`.");
    };
    let profile = ConnectionProfile::new(
        username,
        password,
        database,
        server.unwrap_or_else(|| DEFAULT_SERVER.into()),
        port.unwrap_or_else(|| DEFAULT_PORT.into()),
    );
    Ok((profile, ssl_mode))
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keys_in_fixed_order() {
        let profile = ConnectionProfile::local("root", "secret", "shop");
        assert_eq!(
            connection_string(&profile, SslMode::default()),
            "Server=127.0.0.1;Port=3306;SslMode=None;Database=shop;Uid=root;Pwd=secret;"
        );
    }

    #[test]
    fn parses_rendered_string_back() {
        let profile = ConnectionProfile::new("app", "pw", "shop", "db.internal", "3307");
        let text = connection_string(&profile, SslMode::VerifyFull);
        let (parsed, mode) = parse_connection_string(&text).unwrap();
        assert_eq!(parsed, profile);
        assert_eq!(mode, SslMode::VerifyFull);
    }

    #[test]
    fn accepts_aliases_and_defaults() {
        let (profile, mode) =
            parse_connection_string("User Id=app; Initial Catalog=shop; password=pw; Pooling=false")
                .unwrap();
        assert_eq!(profile.server(), "127.0.0.1");
        assert_eq!(profile.port(), "3306");
        assert_eq!(profile.username(), "app");
        assert_eq!(profile.database(), "shop");
        assert_eq!(profile.password(), "pw");
        assert_eq!(mode, SslMode::None);
    }

    #[test]
    fn rejects_missing_database_and_bad_segments() {
        assert!(parse_connection_string("Server=x;Uid=app;").is_err());
        assert!(parse_connection_string("Server=x;Database=shop;").is_err());
        assert!(parse_connection_string("Server;Database=shop;Uid=app").is_err());
        assert!(parse_connection_string("Database=shop;Uid=app;SslMode=maybe").is_err());
    }
}
