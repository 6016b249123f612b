use anyhow::bail;
use toolbelt_core::{ConnectionProfile, SslMode};
use toolbelt_db::{connection_string, parse_connection_string};
use toolbelt_storage::ConnectionStore;

use crate::Result;

/// Validates `text` and saves its canonical form under `name`.
///
/// The password is blanked unless `save_password` is set. Returns whether an
/// existing entry was replaced.
pub fn add(store: &ConnectionStore, name: &str, text: &str, save_password: bool) -> Result<bool> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Profile name cannot be empty.");
    }
    let (profile, ssl_mode) = parse_connection_string(text)?;
    let profile = if save_password {
        profile
    } else {
        profile.with_password("")
    };
    let replaced = store.put(name, connection_string(&profile, ssl_mode))?;
    Ok(replaced.is_some())
}

/// `name<TAB>connection string` lines with any saved password masked.
pub fn list(store: &ConnectionStore) -> Result<Vec<String>> {
    store
        .load()?
        .into_iter()
        .map(|saved| {
            let (profile, ssl_mode) = parse_connection_string(&saved.connection_string)?;
            let profile = if profile.password().is_empty() {
                profile
            } else {
                profile.with_password("****")
            };
            Ok(format!("{}\t{}", saved.name, connection_string(&profile, ssl_mode)))
        })
        .collect()
}

/// Loads the profile saved as `name`, with `password` taking precedence over a
/// saved one.
pub fn resolve(
    store: &ConnectionStore,
    name: &str,
    password: Option<&str>,
) -> Result<(ConnectionProfile, SslMode)> {
    let Some(text) = store.get(name)? else {
        bail!("No profile named `{name}`.");
    };
    let (profile, ssl_mode) = parse_connection_string(&text)?;
    let profile = match password {
        Some(password) => profile.with_password(password),
        None => profile,
    };
    Ok((profile, ssl_mode))
}
