//! The storage port used by the macro engine.
//!
//! Documents are opaque strings here; the engine owns the JSON shape.  See
//! `infrastructure::storage::macro_store` for the file-system and in-memory
//! implementations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid macro name '{0}'")]
    InvalidName(String),
    #[error("macro '{0}' not found in storage")]
    NotFound(String),
    #[error("storage I/O error for '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Checks a macro name against the rules every store applies.
///
/// Names become file names, so empty names, path separators, `..` and a
/// leading dot are rejected.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.trim().is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.');
    if invalid {
        Err(StorageError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Named persistent documents.
#[cfg_attr(test, mockall::automock)]
pub trait MacroStore: Send {
    fn exists(&self, name: &str) -> bool;
    fn read(&self, name: &str) -> Result<String, StorageError>;
    fn write(&self, name: &str, document: &str) -> Result<(), StorageError>;
    /// Stored names, sorted.
    fn list(&self) -> Result<Vec<String>, StorageError>;
    fn delete(&self, name: &str) -> Result<(), StorageError>;
}
