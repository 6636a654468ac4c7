//! Key-value storage contracts used for cart persistence.
//!
//! # Responsibility
//! - Define the synchronous `get/set/remove` seam between the cart and its
//!   backing store.
//! - Provide an in-memory fake and a SQLite-backed implementation.
//!
//! # Invariants
//! - Adapters never panic; every failure surfaces as `StorageError`.
//! - Values are opaque UTF-8 strings; adapters do not interpret them.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::{latest_schema_version, SqliteStorage};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure raised by a storage adapter.
#[derive(Debug)]
pub enum StorageError {
    /// Backend refuses access (disabled, quota exhausted, read-only).
    Unavailable(String),
    /// SQLite backend failure.
    Sqlite(rusqlite::Error),
    /// Storage file was written by a newer build with an unknown schema.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "storage unavailable: {reason}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "storage schema version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Unavailable(_) | Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Synchronous string key-value store.
pub trait StorageAdapter {
    /// Reads one value; `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Inserts or replaces one value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Deletes one value. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<T: StorageAdapter + ?Sized> StorageAdapter for &T {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

impl<T: StorageAdapter + ?Sized> StorageAdapter for Box<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

impl<T: StorageAdapter + ?Sized> StorageAdapter for Rc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}
