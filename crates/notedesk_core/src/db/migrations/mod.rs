//! Schema migration registry and executor.
//!
//! # Responsibility
//! - Register collection schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - Versions are monotonic; the applied version is mirrored to
//!   `PRAGMA user_version`.
//! - A database written by a newer build is rejected, never downgraded.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

const MIGRATIONS: &[(u32, &str)] = &[(1, include_str!("0001_collections.sql"))];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let applied: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let supported = latest_version();
    if applied > supported {
        return Err(DbError::SchemaTooNew {
            found: applied,
            supported,
        });
    }

    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(version, _)| *version > applied)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        tx.execute_batch(sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {version};"))?;
    }
    tx.commit()?;
    Ok(())
}
