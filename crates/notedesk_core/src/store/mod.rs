//! Durable record-store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the collection/key-indexed persistence API the managers consume.
//! - Keep storage details (SQL, JSON row bodies) inside this boundary.
//!
//! # Invariants
//! - Records are JSON objects keyed by their `id` field.
//! - Each collection has exactly one secondary index, extracted from the
//!   record at write time.
//! - `delete` is idempotent; `add` fails on an existing id.

use crate::db::DbError;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite;

pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// The two persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Folders,
    Notes,
}

impl Collection {
    /// Stable collection name, also the backing table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Folders => "folders",
            Self::Notes => "notes",
        }
    }

    /// Record field feeding the collection's secondary index.
    pub fn index_field(self) -> &'static str {
        match self {
            Self::Folders => "parentId",
            Self::Notes => "folderId",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Secondary-index query value.
///
/// `Null` matches records whose indexed field is null or absent; it is a
/// distinct query, not a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKey {
    Null,
    Id(String),
}

impl IndexKey {
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }
}

/// Aggregate result of a bulk index delete.
///
/// A failed item never aborts the remaining deletes; callers decide how to
/// report the partial outcome.
#[derive(Debug, Default)]
pub struct IndexDeleteOutcome {
    pub deleted: usize,
    pub failures: Vec<IndexDeleteFailure>,
}

#[derive(Debug)]
pub struct IndexDeleteFailure {
    pub id: String,
    pub message: String,
}

/// Store-level error.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// `add` hit an existing record id.
    DuplicateKey { collection: Collection, id: String },
    /// A write was attempted with a record lacking a usable string `id`.
    MissingRecordId(Collection),
    /// A persisted row could not be decoded as a JSON object.
    InvalidRecord {
        collection: Collection,
        message: String,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateKey { collection, id } => {
                write!(f, "duplicate key `{id}` in collection `{collection}`")
            }
            Self::MissingRecordId(collection) => {
                write!(f, "record for collection `{collection}` has no string `id`")
            }
            Self::InvalidRecord {
                collection,
                message,
            } => write!(f, "invalid record in collection `{collection}`: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Transactional, per-collection, key-indexed record store.
///
/// All operations are synchronous and run to completion; there is no
/// cancellation. Implementations must keep `delete` idempotent and report
/// bulk index deletes as an aggregate outcome.
pub trait DurableStore {
    /// Inserts a new record; fails with [`StoreError::DuplicateKey`] when
    /// the id already exists.
    fn add(&self, collection: Collection, record: &Value) -> StoreResult<()>;
    /// Upserts a record.
    fn put(&self, collection: Collection, record: &Value) -> StoreResult<()>;
    /// Loads one record by id.
    fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Value>>;
    /// Loads every record in the collection, order unspecified.
    fn get_all(&self, collection: Collection) -> StoreResult<Vec<Value>>;
    /// Removes one record by id; succeeds when absent.
    fn delete(&self, collection: Collection, id: &str) -> StoreResult<()>;
    /// Loads every record whose indexed field equals `key`.
    fn get_all_by_index(&self, collection: Collection, key: &IndexKey) -> StoreResult<Vec<Value>>;
    /// Deletes every record whose indexed field equals `key`, never
    /// aborting on a single-record failure.
    fn delete_by_index(
        &self,
        collection: Collection,
        key: &IndexKey,
    ) -> StoreResult<IndexDeleteOutcome>;
}
