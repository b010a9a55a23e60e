//! Macro document stores.
//!
//! [`FsMacroStore`] keeps one pretty-printed JSON file per macro,
//! `<directory>/<name>.json`.  The directory is created on first write.
//!
//! Macro names become file names, so names that could escape the directory
//! (path separators, `..`, a leading dot) are rejected with
//! [`StorageError::InvalidName`].
//!
//! [`MemoryMacroStore`] holds documents in a map and is used by tests and by
//! callers that do not want anything written to disk.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::application::macro_store::{validate_name, MacroStore, StorageError};

const EXTENSION: &str = "json";

/// File-system macro store.
#[derive(Debug, Clone)]
pub struct FsMacroStore {
    directory: PathBuf,
}

impl FsMacroStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        Ok(self.directory.join(format!("{name}.{EXTENSION}")))
    }

    fn io_error(name: &str, source: io::Error) -> StorageError {
        if source.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(name.to_string())
        } else {
            StorageError::Io {
                name: name.to_string(),
                source,
            }
        }
    }
}

impl MacroStore for FsMacroStore {
    fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn read(&self, name: &str) -> Result<String, StorageError> {
        let path = self.path_for(name)?;
        fs::read_to_string(&path).map_err(|e| Self::io_error(name, e))
    }

    fn write(&self, name: &str, document: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.directory).map_err(|e| Self::io_error(name, e))?;
        fs::write(&path, document).map_err(|e| Self::io_error(name, e))?;
        debug!(path = %path.display(), "macro written");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    name: self.directory.display().to_string(),
                    source,
                })
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == EXTENSION))
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .filter(|name| validate_name(name).is_ok())
            .collect();
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        fs::remove_file(&path).map_err(|e| Self::io_error(name, e))
    }
}

/// In-memory macro store.  Clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryMacroStore {
    documents: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryMacroStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MacroStore for MemoryMacroStore {
    fn exists(&self, name: &str) -> bool {
        self.documents
            .lock()
            .map(|docs| docs.contains_key(name))
            .unwrap_or(false)
    }

    fn read(&self, name: &str) -> Result<String, StorageError> {
        self.documents
            .lock()
            .ok()
            .and_then(|docs| docs.get(name).cloned())
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn write(&self, name: &str, document: &str) -> Result<(), StorageError> {
        validate_name(name)?;
        if let Ok(mut docs) = self.documents.lock() {
            docs.insert(name.to_string(), document.to_string());
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .documents
            .lock()
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.documents
            .lock()
            .ok()
            .and_then(|mut docs| docs.remove(name))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }
}
