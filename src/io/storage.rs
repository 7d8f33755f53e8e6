//! Durable key/value storage behind the stores.
//!
//! Each store writes its whole encoded state under its own fixed key; keys
//! are never shared and states never nest each other. Writes are
//! best-effort side effects: a failed write is logged by the caller and the
//! in-memory state stays authoritative for the session.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

/// Error type for storage writes.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not create storage directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {key}: {source}")]
    Write {
        key: String,
        source: std::io::Error,
    },
}

/// A keyed text store. Reads that fail for any reason surface as `None`;
/// the codec layer treats that as "use defaults".
pub trait Storage {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Directory-backed storage: one `<key>.json` file per store key. Writes go
/// through a temp file in the same directory and are renamed into place so a
/// crash mid-write never leaves a truncated state file.
pub struct DirStorage {
    dir: PathBuf,
}

impl DirStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;
        Ok(DirStorage { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for DirStorage {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            key: key.to_string(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(&write_err)?;
        tmp.write_all(value.as_bytes()).map_err(&write_err)?;
        tmp.persist(self.path_for(key))
            .map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
