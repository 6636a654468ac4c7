//! `kv_store` schema versions.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - The last applied version is mirrored to `PRAGMA user_version`.
//! - A file stamped with a newer version than this binary knows is refused
//!   before any cart record is read from it.

use crate::storage::{StorageError, StorageResult};
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    sql: include_str!("0001_kv_store.sql"),
}];

/// Latest `kv_store` schema version this binary can read and write.
pub fn latest_schema_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

pub(super) fn stamped_version(conn: &Connection) -> StorageResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings the file up to the latest schema inside one transaction.
pub(super) fn upgrade(conn: &mut Connection) -> StorageResult<()> {
    let found = stamped_version(conn)?;
    let supported = latest_schema_version();

    if found > supported {
        return Err(StorageError::SchemaTooNew { found, supported });
    }
    if found == supported {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > found) {
        tx.execute_batch(step.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))?;
    }
    tx.commit()?;
    Ok(())
}
