//! Persisted resource state
//!
//! One JSON file per table resource. The identifier is the table name itself,
//! so importing an existing table only needs its name.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::schema::TableSpec;

/// Last observed state of a table resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource identifier (the current table name)
    pub id: String,

    /// Observed attributes
    pub attributes: TableSpec,

    /// Timestamp of the last write (RFC 3339)
    pub updated_at: String,
}

impl ResourceState {
    /// Create a state entry stamped with the current time
    pub fn new(id: impl Into<String>, attributes: TableSpec) -> Self {
        Self {
            id: id.into(),
            attributes,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Load state from a JSON file; a missing file means no state
    pub fn load(path: &Path) -> Result<Option<Self>, StateError> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| StateError::IoError(format!("{}: {}", path.display(), e)))?;

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| StateError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Save state to a JSON file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StateError::IoError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StateError::SerializeError(e.to_string()))?;

        std::fs::write(path, json)
            .map_err(|e| StateError::IoError(e.to_string()))
    }

    /// Remove a state file if present
    pub fn remove(path: &Path) -> Result<(), StateError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateError::IoError(e.to_string())),
        }
    }
}

/// State file error types
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
