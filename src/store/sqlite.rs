//! SQLite-backed template store.

use super::{StoreError, StoredCandidate, TemplateStore};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Template store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file. `None` leaves identification without a store.
    pub path: Option<PathBuf>,
    /// Query returning `(id, template)` rows.
    ///
    /// Text columns are taken as base64; blob columns are encoded on read.
    pub query: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            query: "SELECT id, template FROM parents WHERE template IS NOT NULL".to_string(),
        }
    }
}

/// Reads enrolled templates from a SQLite database.
///
/// Each call opens its own read-only connection and drops it before
/// returning.
#[derive(Debug, Clone)]
pub struct SqliteTemplateStore {
    path: PathBuf,
    query: String,
}

impl SqliteTemplateStore {
    pub fn new(path: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
        }
    }

    /// Creates a store from configuration.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let path = config.path.as_ref().ok_or(StoreError::NotConfigured)?;
        Ok(Self::new(path.clone(), config.query.clone()))
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StoreError::Open {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl TemplateStore for SqliteTemplateStore {
    fn load_candidates(&self) -> Result<Vec<StoredCandidate>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&self.query)?;

        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let encoded = match row.get_ref(1)? {
                ValueRef::Null => None,
                ValueRef::Text(text) => Some(String::from_utf8_lossy(text).into_owned()),
                ValueRef::Blob(blob) => Some(STANDARD.encode(blob)),
                other => {
                    return Err(rusqlite::Error::InvalidColumnType(
                        1,
                        "template".to_string(),
                        other.data_type(),
                    ))
                }
            };
            Ok(encoded.map(|e| StoredCandidate::new(id, e)))
        })?;

        let mut candidates = Vec::new();
        for row in rows {
            if let Some(candidate) = row? {
                candidates.push(candidate);
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            candidates = candidates.len(),
            "Loaded enrolled templates"
        );
        Ok(candidates)
    }
}
