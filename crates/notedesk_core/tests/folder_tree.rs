use notedesk_core::{
    Collection, DurableStore, FolderTree, FolderTreeError, IndexKey, SqliteStore, StoreError,
    StoreResult,
};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

fn setup() -> (Arc<SqliteStore>, FolderTree<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let tree = FolderTree::new(Arc::clone(&store));
    (store, tree)
}

fn note_record(folder: &str) -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "folderId": folder,
        "title": "Untitled Note",
        "content": "",
        "createdAt": 1,
        "updatedAt": 1,
    })
}

#[test]
fn create_keeps_list_sorted_case_insensitive() {
    let (_store, mut tree) = setup();
    tree.create("banana", None, 1).unwrap();
    tree.create("Apple", None, 2).unwrap();
    tree.create("cherry", None, 3).unwrap();

    let names: Vec<&str> = tree.folders().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Apple", "banana", "cherry"]);
}

#[test]
fn equal_names_keep_insertion_order() {
    let (_store, mut tree) = setup();
    let first = tree.create("Notes", None, 1).unwrap();
    let second = tree.create("notes", None, 2).unwrap();

    let ids: Vec<_> = tree.folders().iter().map(|f| f.id).collect();
    assert_eq!(ids, [first.id, second.id]);
}

#[test]
fn create_rejects_blank_name_before_io() {
    let (store, mut tree) = setup();
    let err = tree.create("   ", None, 1).unwrap_err();
    assert!(matches!(err, FolderTreeError::BlankName));
    assert!(tree.folders().is_empty());
    assert!(store.get_all(Collection::Folders).unwrap().is_empty());
}

#[test]
fn create_rejects_unknown_parent() {
    let (_store, mut tree) = setup();
    let ghost = Uuid::new_v4();
    let err = tree.create("Child", Some(ghost), 1).unwrap_err();
    assert!(matches!(err, FolderTreeError::ParentNotFound(id) if id == ghost));
    assert!(tree.folders().is_empty());
}

#[test]
fn load_all_skips_malformed_records() {
    let (store, mut tree) = setup();
    store
        .add(
            Collection::Folders,
            &json!({
                "id": Uuid::new_v4().to_string(),
                "name": "Kept",
                "parentId": null,
                "createdAt": 1,
            }),
        )
        .unwrap();
    // Missing name: dropped at load, not fatal.
    store
        .add(
            Collection::Folders,
            &json!({"id": Uuid::new_v4().to_string(), "parentId": null}),
        )
        .unwrap();

    tree.load_all().unwrap();
    assert_eq!(tree.folders().len(), 1);
    assert_eq!(tree.folders()[0].name, "Kept");
}

#[test]
fn load_all_normalizes_missing_parent_to_root() {
    let (store, mut tree) = setup();
    store
        .add(
            Collection::Folders,
            &json!({"id": Uuid::new_v4().to_string(), "name": "Loose"}),
        )
        .unwrap();

    tree.load_all().unwrap();
    assert_eq!(tree.folders()[0].parent_id, None);
}

#[test]
fn cascade_delete_removes_exact_closure() {
    let (store, mut tree) = setup();
    let root_a = tree.create("A", None, 1).unwrap();
    let child_b = tree.create("B", Some(root_a.id), 2).unwrap();
    let sibling = tree.create("C", None, 3).unwrap();

    store
        .add(Collection::Notes, &note_record(&root_a.id.to_string()))
        .unwrap();
    store
        .add(Collection::Notes, &note_record(&child_b.id.to_string()))
        .unwrap();
    let outside = note_record(&sibling.id.to_string());
    store.add(Collection::Notes, &outside).unwrap();

    let outcome = tree.delete(root_a.id).unwrap();
    assert_eq!(outcome.folders.len(), 2);
    assert!(outcome.folders.contains(&root_a.id));
    assert!(outcome.folders.contains(&child_b.id));
    assert_eq!(outcome.notes.len(), 2);
    assert!(outcome.failures.is_empty());

    // Memory: only the sibling remains.
    let ids: Vec<_> = tree.folders().iter().map(|f| f.id).collect();
    assert_eq!(ids, [sibling.id]);

    // Store: closure gone, outside note untouched.
    let folder_ids: Vec<String> = store
        .get_all(Collection::Folders)
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(folder_ids, [sibling.id.to_string()]);
    let notes = store.get_all(Collection::Notes).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["id"], outside["id"]);
}

#[test]
fn delete_clears_selection_inside_closure() {
    let (_store, mut tree) = setup();
    let root = tree.create("A", None, 1).unwrap();
    let child = tree.create("B", Some(root.id), 2).unwrap();
    tree.select(Some(child.id));

    tree.delete(root.id).unwrap();
    assert_eq!(tree.selected(), None);
}

#[test]
fn repeated_delete_is_noop() {
    let (store, mut tree) = setup();
    let root = tree.create("A", None, 1).unwrap();

    assert!(tree.delete(root.id).is_some());
    assert!(tree.delete(root.id).is_none());
    assert!(tree.folders().is_empty());
    assert!(store.get_all(Collection::Folders).unwrap().is_empty());
}

#[test]
fn toggle_expansion_flips_membership() {
    let (_store, mut tree) = setup();
    let folder = tree.create("A", None, 1).unwrap();

    assert!(!tree.is_expanded(folder.id));
    assert!(tree.toggle_expansion(folder.id));
    assert!(tree.is_expanded(folder.id));
    assert!(!tree.toggle_expansion(folder.id));
    assert!(!tree.is_expanded(folder.id));
}

#[test]
fn select_same_folder_is_noop() {
    let (_store, mut tree) = setup();
    let folder = tree.create("A", None, 1).unwrap();

    assert!(tree.select(Some(folder.id)));
    assert!(!tree.select(Some(folder.id)));
    assert_eq!(tree.selected(), Some(folder.id));
}

// ---------------------------------------------------------------------------
// Failure injection
// ---------------------------------------------------------------------------

/// Store wrapper that fails selected operations, for error-path tests.
struct FailingStore {
    inner: SqliteStore,
    fail_delete_ids: RefCell<HashSet<String>>,
    fail_get_all: Cell<bool>,
}

impl FailingStore {
    fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            fail_delete_ids: RefCell::new(HashSet::new()),
            fail_get_all: Cell::new(false),
        }
    }

    fn injected(&self, collection: Collection) -> StoreError {
        StoreError::InvalidRecord {
            collection,
            message: "injected failure".to_string(),
        }
    }
}

impl DurableStore for FailingStore {
    fn add(&self, collection: Collection, record: &Value) -> StoreResult<()> {
        self.inner.add(collection, record)
    }

    fn put(&self, collection: Collection, record: &Value) -> StoreResult<()> {
        self.inner.put(collection, record)
    }

    fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Value>> {
        self.inner.get(collection, id)
    }

    fn get_all(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        if self.fail_get_all.get() {
            return Err(self.injected(collection));
        }
        self.inner.get_all(collection)
    }

    fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        if self.fail_delete_ids.borrow().contains(id) {
            return Err(self.injected(collection));
        }
        self.inner.delete(collection, id)
    }

    fn get_all_by_index(&self, collection: Collection, key: &IndexKey) -> StoreResult<Vec<Value>> {
        self.inner.get_all_by_index(collection, key)
    }

    fn delete_by_index(
        &self,
        collection: Collection,
        key: &IndexKey,
    ) -> StoreResult<notedesk_core::IndexDeleteOutcome> {
        self.inner.delete_by_index(collection, key)
    }
}

#[test]
fn load_failure_resets_to_empty_state() {
    let store = Arc::new(FailingStore::new());
    let mut tree = FolderTree::new(Arc::clone(&store));
    tree.create("A", None, 1).unwrap();
    assert_eq!(tree.folders().len(), 1);

    store.fail_get_all.set(true);
    assert!(tree.load_all().is_err());
    assert!(tree.folders().is_empty());
    assert_eq!(tree.selected(), None);
}

#[test]
fn cascade_collects_per_item_failures_and_continues() {
    let store = Arc::new(FailingStore::new());
    let mut tree = FolderTree::new(Arc::clone(&store));
    let root = tree.create("A", None, 1).unwrap();

    let stuck = note_record(&root.id.to_string());
    let removable = note_record(&root.id.to_string());
    store.add(Collection::Notes, &stuck).unwrap();
    store.add(Collection::Notes, &removable).unwrap();
    store
        .fail_delete_ids
        .borrow_mut()
        .insert(stuck["id"].as_str().unwrap().to_string());

    let outcome = tree.delete(root.id).unwrap();
    assert_eq!(outcome.notes.len(), 2);
    assert_eq!(outcome.failures.len(), 1);

    // The failed item survives in the store, everything else is gone;
    // memory reflects the attempted closure.
    assert!(tree.folders().is_empty());
    let remaining = store.get_all(Collection::Notes).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"], stuck["id"]);
    assert!(store.get_all(Collection::Folders).unwrap().is_empty());
}
