//! SQLite bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure the embedded database backing the record store.
//! - Apply schema migrations in deterministic order before any data access.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No collection is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Bootstrap-level database error.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The database file was written by a newer build; refusing to touch it.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "database schema version {found} exceeds supported version {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
