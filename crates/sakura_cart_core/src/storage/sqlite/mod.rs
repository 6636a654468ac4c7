//! SQLite-backed key-value storage.
//!
//! # Invariants
//! - Every constructor upgrades the `kv_store` schema before returning, so
//!   the table always exists before the first read.
//! - Every open attempt emits one `storage_open` start event and one outcome
//!   event.
//! - `set` is an upsert; `remove` of an absent key is not an error.

use super::{StorageAdapter, StorageResult};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{Duration, Instant};

mod schema;

pub use schema::latest_schema_version;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
enum Location<'a> {
    File(&'a Path),
    Memory,
}

impl Location<'_> {
    fn label(self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }

    fn connect(self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}

/// Durable storage adapter over one SQLite connection.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) a storage file.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_at(Location::File(path.as_ref()))
    }

    /// Private in-memory store; contents vanish on drop.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::open_at(Location::Memory)
    }

    /// Schema version stamped on the open file.
    pub fn schema_version(&self) -> StorageResult<u32> {
        schema::stamped_version(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn open_at(location: Location<'_>) -> StorageResult<Self> {
        let started_at = Instant::now();
        info!(
            "event=storage_open module=storage status=start mode={}",
            location.label()
        );

        match connect_and_upgrade(location) {
            Ok(conn) => {
                info!(
                    "event=storage_open module=storage status=ok mode={} duration_ms={}",
                    location.label(),
                    started_at.elapsed().as_millis()
                );
                Ok(Self { conn })
            }
            Err(err) => {
                error!(
                    "event=storage_open module=storage status=error mode={} duration_ms={} error={}",
                    location.label(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn connect_and_upgrade(location: Location<'_>) -> StorageResult<Connection> {
    let mut conn = location.connect()?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    schema::upgrade(&mut conn)?;
    Ok(conn)
}

impl StorageAdapter for SqliteStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(())
    }
}
