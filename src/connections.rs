//! Named connections saved under `~/.sqcl/connections.json`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedConnection {
    pub name: String,
    pub driver: String,
    pub dsn: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConnectionsFile {
    #[serde(default)]
    connections: Vec<SavedConnection>,
}

pub struct ConnectionStore {
    path: PathBuf,
}

impl ConnectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the user's home directory, or `./.sqcl` without one.
    pub fn open_default() -> Self {
        let base = dirs::home_dir().unwrap_or_default();
        Self::new(base.join(".sqcl").join("connections.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<SavedConnection>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let file: ConnectionsFile = serde_json::from_str(&content)?;
        Ok(file.connections)
    }

    pub fn get(&self, name: &str) -> Result<SavedConnection> {
        self.list()?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::ConnectionNotFound(name.to_string()))
    }

    /// Insert, or replace the entry with the same name in place.
    pub fn save(&self, connection: SavedConnection) -> Result {
        let mut connections = self.list()?;
        match connections.iter_mut().find(|c| c.name == connection.name) {
            Some(existing) => *existing = connection,
            None => connections.push(connection),
        }
        self.write(connections)
    }

    pub fn remove(&self, name: &str) -> Result {
        let mut connections = self.list()?;
        let before = connections.len();
        connections.retain(|c| c.name != name);
        if connections.len() == before {
            return Err(Error::ConnectionNotFound(name.to_string()));
        }
        self.write(connections)
    }

    fn write(&self, connections: Vec<SavedConnection>) -> Result {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&ConnectionsFile { connections })?;
        fs::write(&self.path, content)?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path().display(), "saved connections written");
        Ok(())
    }
}

/// The file holds passwords; keep it owner-only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result {
    Ok(())
}
