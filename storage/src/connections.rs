use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use toolbelt_core::Result;

/// A connection string saved under a name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedConnection {
    pub name: String,
    pub connection_string: String,
}

/// Named connection strings, kept as `connections.json` in the config directory.
#[derive(Clone, Debug)]
pub struct ConnectionStore {
    path: PathBuf,
}

impl ConnectionStore {
    pub fn new(config_dir: &Path) -> Self {
        let path = config_dir.join("connections.json");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<SavedConnection>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let connections: Vec<SavedConnection> = serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse {}", self.path.display()))?;
                Ok(connections)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, connections: &[SavedConnection]) -> Result<()> {
        let serialized = serde_json::to_string_pretty(connections)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!(
            count = connections.len(),
            "Saved connections to {}",
            self.path.display()
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .load()?
            .into_iter()
            .find(|saved| saved.name == name)
            .map(|saved| saved.connection_string))
    }

    /// Saves `connection_string` under `name`, returning the string it replaced.
    pub fn put(&self, name: &str, connection_string: String) -> Result<Option<String>> {
        let mut connections = self.load()?;
        let replaced = match connections.iter_mut().find(|saved| saved.name == name) {
            Some(saved) => Some(std::mem::replace(
                &mut saved.connection_string,
                connection_string,
            )),
            None => {
                connections.push(SavedConnection {
                    name: name.to_string(),
                    connection_string,
                });
                None
            }
        };
        self.save(&connections)?;
        Ok(replaced)
    }

    pub fn remove(&self, name: &str) -> Result<Option<String>> {
        let mut connections = self.load()?;
        let Some(idx) = connections.iter().position(|saved| saved.name == name) else {
            return Ok(None);
        };
        let removed = connections.remove(idx);
        self.save(&connections)?;
        Ok(Some(removed.connection_string))
    }
}
