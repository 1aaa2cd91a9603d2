use notedesk_core::{Collection, DurableStore, IndexKey, SqliteStore, StoreError};
use serde_json::{json, Value};
use uuid::Uuid;

fn setup() -> SqliteStore {
    SqliteStore::open_in_memory().unwrap()
}

fn folder_record(id: &str, name: &str, parent: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": name,
        "parentId": parent,
        "createdAt": 1,
    })
}

fn note_record(id: &str, folder: Option<&str>) -> Value {
    json!({
        "id": id,
        "folderId": folder,
        "title": "Untitled Note",
        "content": "",
        "createdAt": 1,
        "updatedAt": 1,
    })
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[test]
fn add_then_get_round_trips() {
    let store = setup();
    let id = new_id();
    store
        .add(Collection::Folders, &folder_record(&id, "Inbox", None))
        .unwrap();

    let loaded = store.get(Collection::Folders, &id).unwrap().unwrap();
    assert_eq!(loaded["name"], "Inbox");
    assert_eq!(loaded["parentId"], Value::Null);
}

#[test]
fn get_of_unknown_id_is_none() {
    let store = setup();
    assert!(store.get(Collection::Folders, &new_id()).unwrap().is_none());
}

#[test]
fn add_rejects_duplicate_id() {
    let store = setup();
    let id = new_id();
    store
        .add(Collection::Folders, &folder_record(&id, "First", None))
        .unwrap();

    let err = store
        .add(Collection::Folders, &folder_record(&id, "Second", None))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::DuplicateKey { collection: Collection::Folders, id: dup } if dup == id
    ));
}

#[test]
fn put_upserts_existing_record() {
    let store = setup();
    let id = new_id();
    store
        .add(Collection::Notes, &note_record(&id, None))
        .unwrap();

    let mut updated = note_record(&id, None);
    updated["title"] = json!("Renamed");
    store.put(Collection::Notes, &updated).unwrap();

    let loaded = store.get(Collection::Notes, &id).unwrap().unwrap();
    assert_eq!(loaded["title"], "Renamed");
    assert_eq!(store.get_all(Collection::Notes).unwrap().len(), 1);
}

#[test]
fn delete_is_idempotent() {
    let store = setup();
    let id = new_id();
    store
        .add(Collection::Notes, &note_record(&id, None))
        .unwrap();

    store.delete(Collection::Notes, &id).unwrap();
    // Second delete of an absent record still succeeds.
    store.delete(Collection::Notes, &id).unwrap();
    assert!(store.get(Collection::Notes, &id).unwrap().is_none());
}

#[test]
fn write_without_record_id_is_rejected() {
    let store = setup();
    let err = store
        .add(Collection::Folders, &json!({"name": "NoId"}))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::MissingRecordId(Collection::Folders)
    ));
}

#[test]
fn null_index_key_is_a_distinct_query() {
    let store = setup();
    let parent = new_id();
    store
        .add(Collection::Folders, &folder_record(&parent, "Root", None))
        .unwrap();
    store
        .add(
            Collection::Folders,
            &folder_record(&new_id(), "Child", Some(parent.as_str())),
        )
        .unwrap();

    let roots = store
        .get_all_by_index(Collection::Folders, &IndexKey::Null)
        .unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["name"], "Root");

    let children = store
        .get_all_by_index(Collection::Folders, &IndexKey::id(parent.as_str()))
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["name"], "Child");

    assert_eq!(store.get_all(Collection::Folders).unwrap().len(), 2);
}

#[test]
fn delete_by_index_reports_aggregate_outcome() {
    let store = setup();
    let folder = new_id();
    for _ in 0..3 {
        store
            .add(Collection::Notes, &note_record(&new_id(), Some(folder.as_str())))
            .unwrap();
    }
    store
        .add(Collection::Notes, &note_record(&new_id(), None))
        .unwrap();

    let outcome = store
        .delete_by_index(Collection::Notes, &IndexKey::id(folder.as_str()))
        .unwrap();
    assert_eq!(outcome.deleted, 3);
    assert!(outcome.failures.is_empty());

    let remaining = store.get_all(Collection::Notes).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["folderId"], Value::Null);
}
