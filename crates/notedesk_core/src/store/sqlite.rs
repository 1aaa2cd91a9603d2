//! SQLite-backed record store.
//!
//! # Responsibility
//! - Persist collection records as JSON row bodies with one extracted
//!   secondary-index column.
//!
//! # Invariants
//! - The connection is migrated before any collection access.
//! - Bulk index deletes attempt every matching row and aggregate failures.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::store::{
    Collection, DurableStore, IndexDeleteFailure, IndexDeleteOutcome, IndexKey, StoreError,
    StoreResult,
};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;
use std::path::Path;

/// Record store over an embedded SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (and migrates) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens (and migrates) an in-memory store.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }
}

impl DurableStore for SqliteStore {
    fn add(&self, collection: Collection, record: &Value) -> StoreResult<()> {
        let id = record_id(collection, record)?;
        let index_key = index_key_of(collection, record);
        let inserted = self.conn.execute(
            &format!(
                "INSERT INTO {} (id, index_key, body) VALUES (?1, ?2, ?3);",
                collection.name()
            ),
            params![id, index_key, record.to_string()],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateKey { collection, id })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, collection: Collection, record: &Value) -> StoreResult<()> {
        let id = record_id(collection, record)?;
        let index_key = index_key_of(collection, record);
        self.conn.execute(
            &format!(
                "INSERT INTO {} (id, index_key, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT (id) DO UPDATE
                 SET index_key = excluded.index_key,
                     body = excluded.body;",
                collection.name()
            ),
            params![id, index_key, record.to_string()],
        )?;
        Ok(())
    }

    fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT body FROM {} WHERE id = ?1;", collection.name()),
                [id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|text| parse_body(collection, &text)).transpose()
    }

    fn get_all(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT body FROM {};", collection.name()))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            records.push(parse_body(collection, &body)?);
        }
        Ok(records)
    }

    fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", collection.name()),
            [id],
        )?;
        Ok(())
    }

    fn get_all_by_index(&self, collection: Collection, key: &IndexKey) -> StoreResult<Vec<Value>> {
        let sql = match key {
            IndexKey::Null => format!(
                "SELECT body FROM {} WHERE index_key IS NULL;",
                collection.name()
            ),
            IndexKey::Id(_) => format!(
                "SELECT body FROM {} WHERE index_key = ?1;",
                collection.name()
            ),
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = match key {
            IndexKey::Null => stmt.query([])?,
            IndexKey::Id(value) => stmt.query([value.as_str()])?,
        };
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            records.push(parse_body(collection, &body)?);
        }
        Ok(records)
    }

    fn delete_by_index(
        &self,
        collection: Collection,
        key: &IndexKey,
    ) -> StoreResult<IndexDeleteOutcome> {
        let ids = self.matching_ids(collection, key)?;
        let mut outcome = IndexDeleteOutcome::default();
        for id in ids {
            match self.delete(collection, &id) {
                Ok(()) => outcome.deleted += 1,
                Err(err) => outcome.failures.push(IndexDeleteFailure {
                    id,
                    message: err.to_string(),
                }),
            }
        }
        Ok(outcome)
    }
}

impl SqliteStore {
    fn matching_ids(&self, collection: Collection, key: &IndexKey) -> StoreResult<Vec<String>> {
        let sql = match key {
            IndexKey::Null => format!(
                "SELECT id FROM {} WHERE index_key IS NULL;",
                collection.name()
            ),
            IndexKey::Id(_) => format!("SELECT id FROM {} WHERE index_key = ?1;", collection.name()),
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = match key {
            IndexKey::Null => stmt.query([])?,
            IndexKey::Id(value) => stmt.query([value.as_str()])?,
        };
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }
}

fn record_id(collection: Collection, record: &Value) -> StoreResult<String> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(StoreError::MissingRecordId(collection))
}

fn index_key_of(collection: Collection, record: &Value) -> Option<String> {
    record
        .get(collection.index_field())
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_body(collection: Collection, body: &str) -> StoreResult<Value> {
    serde_json::from_str(body).map_err(|err| StoreError::InvalidRecord {
        collection,
        message: err.to_string(),
    })
}
