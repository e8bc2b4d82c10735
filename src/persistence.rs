//! JSON document store for the roster, the current tournament and the archive.

use crate::models::{Roster, Tournament};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};

/// Everything the organizer keeps between runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppData {
    #[serde(default)]
    pub roster: Roster,
    #[serde(default)]
    pub tournament: Option<Tournament>,
    /// Archived (completed) tournaments, oldest first.
    #[serde(default)]
    pub history: Vec<Tournament>,
}

impl AppData {
    /// Parse a saved document. Each top-level field that is missing or
    /// malformed falls back to its empty value instead of failing the load.
    pub fn from_json(text: &str) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Saved data is not valid JSON, starting empty: {}", e);
                return Self::default();
            }
        };
        Self {
            roster: field_or_default(&value, "roster"),
            tournament: field_or_default(&value, "tournament"),
            history: field_or_default(&value, "history"),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn field_or_default<T: DeserializeOwned + Default>(value: &Value, key: &str) -> T {
    match value.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed `{}` in saved data: {}", key, e);
            T::default()
        }),
    }
}

/// Saves and loads `AppData` as a single JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A missing or unreadable file is an empty document.
    pub fn load(&self) -> AppData {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => AppData::from_json(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No saved data at {}, starting empty", self.path.display());
                AppData::default()
            }
            Err(e) => {
                log::warn!("Could not read {}: {}", self.path.display(), e);
                AppData::default()
            }
        }
    }

    /// Write the document via a temp file so a crash never leaves half a file.
    pub fn save(&self, data: &AppData) -> io::Result<()> {
        let json = data.to_json().map_err(io::Error::other)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }

    /// Same as `save`, without blocking the caller's thread.
    pub async fn save_async(&self, data: AppData) -> io::Result<()> {
        let json = data.to_json().map_err(io::Error::other)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
