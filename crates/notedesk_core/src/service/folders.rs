//! Folder tree manager.
//!
//! # Responsibility
//! - Own the in-memory folder forest, its selection and expansion state.
//! - Perform cascading deletion over the durable collections.
//!
//! # Invariants
//! - The folder list is always sorted by name (case-insensitive, stable).
//! - Memory is mutated only after the corresponding store write succeeds;
//!   cascade deletion removes from memory exactly the attempted closure.
//! - At most one deletion is in flight per folder id.

use crate::model::folder::{Folder, FolderId};
use crate::model::now_ms;
use crate::store::{Collection, DurableStore, IndexKey, StoreError};
use log::{info, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Errors from folder tree operations.
#[derive(Debug)]
pub enum FolderTreeError {
    /// Folder name is blank after trimming.
    BlankName,
    /// Supplied parent references no known folder.
    ParentNotFound(FolderId),
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for FolderTreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "folder name must not be blank"),
            Self::ParentNotFound(id) => write!(f, "parent folder not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FolderTreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for FolderTreeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Result of one cascading folder deletion.
///
/// `folders` and `notes` list every id a delete was attempted for;
/// `failures` the per-item errors that were logged and skipped.
#[derive(Debug)]
pub struct CascadeOutcome {
    pub folders: Vec<FolderId>,
    pub notes: Vec<Uuid>,
    pub failures: Vec<CascadeFailure>,
}

#[derive(Debug)]
pub struct CascadeFailure {
    pub collection: Collection,
    pub id: Uuid,
    pub message: String,
}

/// In-memory folder forest over the durable store.
pub struct FolderTree<S> {
    store: Arc<S>,
    folders: Vec<Folder>,
    expanded: HashSet<FolderId>,
    selected: Option<FolderId>,
    deleting: HashSet<FolderId>,
}

impl<S: DurableStore> FolderTree<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            folders: Vec::new(),
            expanded: HashSet::new(),
            selected: None,
            deleting: HashSet::new(),
        }
    }

    /// Rebuilds the in-memory forest from the store.
    ///
    /// Malformed records are dropped individually with a warning; a
    /// store-level failure leaves the manager in a well-defined empty state
    /// and propagates.
    pub fn load_all(&mut self) -> Result<(), FolderTreeError> {
        self.folders.clear();
        self.expanded.clear();
        self.selected = None;

        let records = self.store.get_all(Collection::Folders)?;
        let fallback = now_ms();
        for record in &records {
            match Folder::from_record(record, fallback) {
                Ok(folder) => self.folders.push(folder),
                Err(err) => {
                    warn!("event=folder_load module=folders status=record_skipped error={err}");
                }
            }
        }
        self.sort();
        info!(
            "event=folder_load module=folders status=ok count={}",
            self.folders.len()
        );
        Ok(())
    }

    /// Creates and persists one folder under an optional parent.
    ///
    /// On persistence failure the in-memory forest is untouched.
    pub fn create(
        &mut self,
        name: &str,
        parent_id: Option<FolderId>,
        now: i64,
    ) -> Result<Folder, FolderTreeError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(FolderTreeError::BlankName);
        }
        if let Some(parent_id) = parent_id {
            if !self.contains(parent_id) {
                return Err(FolderTreeError::ParentNotFound(parent_id));
            }
        }

        let folder = Folder::new(trimmed, parent_id, now);
        self.store.add(Collection::Folders, &folder.to_record())?;
        self.folders.push(folder.clone());
        self.sort();
        Ok(folder)
    }

    /// Changes the selected folder. Returns false when nothing changed.
    pub fn select(&mut self, folder_id: Option<FolderId>) -> bool {
        if self.selected == folder_id {
            return false;
        }
        self.selected = folder_id;
        true
    }

    /// Deletes a folder together with its whole subtree and every note in
    /// it.
    ///
    /// Discovery walks the store's secondary indexes with an explicit
    /// worklist and completes before any delete is issued; individual
    /// lookup or delete failures are logged and skipped. Returns `None`
    /// when the folder is unknown or a deletion for it is already in
    /// flight.
    pub fn delete(&mut self, folder_id: FolderId) -> Option<CascadeOutcome> {
        if self.deleting.contains(&folder_id) || !self.contains(folder_id) {
            return None;
        }
        self.deleting.insert(folder_id);
        let outcome = self.cascade(folder_id);
        self.deleting.remove(&folder_id);
        info!(
            "event=folder_delete module=folders status=ok folders={} notes={} failures={}",
            outcome.folders.len(),
            outcome.notes.len(),
            outcome.failures.len()
        );
        Some(outcome)
    }

    /// Flips display expansion for one folder. Returns the new state.
    pub fn toggle_expansion(&mut self, folder_id: FolderId) -> bool {
        if self.expanded.remove(&folder_id) {
            false
        } else {
            self.expanded.insert(folder_id);
            true
        }
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn get(&self, folder_id: FolderId) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.id == folder_id)
    }

    pub fn contains(&self, folder_id: FolderId) -> bool {
        self.get(folder_id).is_some()
    }

    pub fn folder_ids(&self) -> HashSet<FolderId> {
        self.folders.iter().map(|folder| folder.id).collect()
    }

    pub fn selected(&self) -> Option<FolderId> {
        self.selected
    }

    pub fn is_expanded(&self, folder_id: FolderId) -> bool {
        self.expanded.contains(&folder_id)
    }

    fn cascade(&mut self, root: FolderId) -> CascadeOutcome {
        // Discovery phase: the deletion set is fixed before the first
        // delete is issued.
        let mut folders = Vec::new();
        let mut notes = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![root];
        while let Some(folder_id) = pending.pop() {
            if !seen.insert(folder_id) {
                continue;
            }
            folders.push(folder_id);
            let key = IndexKey::id(folder_id.to_string());
            match self.store.get_all_by_index(Collection::Notes, &key) {
                Ok(records) => notes.extend(record_ids(&records)),
                Err(err) => warn!(
                    "event=folder_delete module=folders status=lookup_failed kind=notes folder={folder_id} error={err}"
                ),
            }
            match self.store.get_all_by_index(Collection::Folders, &key) {
                Ok(records) => pending.extend(record_ids(&records)),
                Err(err) => warn!(
                    "event=folder_delete module=folders status=lookup_failed kind=subfolders folder={folder_id} error={err}"
                ),
            }
        }

        // Deletion phase: best-effort per item, settle all before touching
        // memory.
        let mut failures = Vec::new();
        for note_id in &notes {
            if let Err(err) = self.store.delete(Collection::Notes, &note_id.to_string()) {
                warn!(
                    "event=folder_delete module=folders status=item_failed collection=notes id={note_id} error={err}"
                );
                failures.push(CascadeFailure {
                    collection: Collection::Notes,
                    id: *note_id,
                    message: err.to_string(),
                });
            }
        }
        for folder_id in &folders {
            if let Err(err) = self
                .store
                .delete(Collection::Folders, &folder_id.to_string())
            {
                warn!(
                    "event=folder_delete module=folders status=item_failed collection=folders id={folder_id} error={err}"
                );
                failures.push(CascadeFailure {
                    collection: Collection::Folders,
                    id: *folder_id,
                    message: err.to_string(),
                });
            }
        }

        // Memory reflects the attempted set; a failed delete leaves a
        // divergence until the next full reload.
        let closure: HashSet<FolderId> = folders.iter().copied().collect();
        self.folders.retain(|folder| !closure.contains(&folder.id));
        self.expanded.retain(|id| !closure.contains(id));
        if self.selected.is_some_and(|id| closure.contains(&id)) {
            self.selected = None;
        }

        CascadeOutcome {
            folders,
            notes,
            failures,
        }
    }

    fn sort(&mut self) {
        // Stable sort keeps insertion order among equal names.
        self.folders
            .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    }
}

fn record_ids(records: &[Value]) -> Vec<Uuid> {
    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        let parsed = record
            .get("id")
            .and_then(Value::as_str)
            .and_then(|text| Uuid::parse_str(text).ok());
        match parsed {
            Some(id) => ids.push(id),
            None => {
                warn!("event=folder_delete module=folders status=record_skipped reason=missing_or_invalid_id");
            }
        }
    }
    ids
}
