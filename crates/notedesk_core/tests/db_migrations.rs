use notedesk_core::db::migrations::latest_version;
use notedesk_core::db::{open_db, open_db_in_memory, DbError};
use notedesk_core::{Collection, DurableStore, SqliteStore};
use serde_json::json;

#[test]
fn migration_creates_collection_tables() {
    let conn = open_db_in_memory().unwrap();

    for table in ["folders", "notes"] {
        let exists: i64 = conn
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
                );",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1, "table {table} should exist");

        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table});"))
            .unwrap();
        let mut rows = stmt.query([]).unwrap();
        let mut columns = Vec::new();
        while let Some(row) = rows.next().unwrap() {
            let column_name: String = row.get(1).unwrap();
            columns.push(column_name);
        }
        for column in ["id", "index_key", "body"] {
            assert!(columns.contains(&column.to_string()));
        }
    }
}

#[test]
fn migration_creates_secondary_indexes() {
    let conn = open_db_in_memory().unwrap();

    for index in ["idx_folders_parent", "idx_notes_folder"] {
        let exists: i64 = conn
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1
                );",
                [index],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1, "index {index} should exist");
    }
}

#[test]
fn user_version_is_stamped_to_latest() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn reopen_keeps_persisted_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notedesk.sqlite3");

    {
        let store = SqliteStore::open(&path).unwrap();
        store
            .add(
                Collection::Folders,
                &json!({
                    "id": "2f3b1c9e-64a1-47f8-8f70-b6f2a92f8a11",
                    "name": "Persistent",
                    "parentId": null,
                    "createdAt": 1,
                }),
            )
            .unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let record = store
        .get(Collection::Folders, "2f3b1c9e-64a1-47f8-8f70-b6f2a92f8a11")
        .unwrap()
        .unwrap();
    assert_eq!(record["name"], "Persistent");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notedesk.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
    }

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::SchemaTooNew { found: 99, .. }));
}
