//! Note collection manager.
//!
//! # Responsibility
//! - Own the per-folder grouping of notes and keep it synchronized with
//!   the durable store.
//! - Reconcile folder references at load time (orphan cleanup).
//!
//! # Invariants
//! - Every cached note belongs to a folder key present in the folder
//!   forest, or to the null (unfiled) key.
//! - Each group is sorted by `updated_at` descending.
//! - A save that changes nothing issues no store write.
//! - At most one deletion is in flight per note id.

use crate::model::folder::FolderId;
use crate::model::note::{effective_title, Note, NoteId};
use crate::model::now_ms;
use crate::store::{Collection, DurableStore, StoreError};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const PREVIEW_MAX_CHARS: usize = 100;

static IMAGE_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\(([^)]+)\)").expect("valid image marker regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Errors from note collection operations.
#[derive(Debug)]
pub enum NoteCollectionError {
    /// Note absent from memory and from the store.
    NoteNotFound(NoteId),
    /// Stored record belongs to a different folder than expected; a data
    /// inconsistency, not recoverable locally.
    FolderMismatch {
        note_id: NoteId,
        expected: Option<FolderId>,
        actual: Option<FolderId>,
    },
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for NoteCollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::FolderMismatch {
                note_id,
                expected,
                actual,
            } => write!(
                f,
                "note {note_id} belongs to folder {actual:?}, expected {expected:?}"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteCollectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for NoteCollectionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Result of a save command.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved(Note),
    /// Title and content matched the persisted snapshot; nothing written.
    Unchanged,
}

/// In-memory per-folder note grouping over the durable store.
pub struct NoteCollection<S> {
    store: Arc<S>,
    groups: HashMap<Option<FolderId>, Vec<Note>>,
    deleting: HashSet<NoteId>,
    just_created: Option<NoteId>,
}

impl<S: DurableStore> NoteCollection<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            groups: HashMap::new(),
            deleting: HashSet::new(),
            just_created: None,
        }
    }

    /// Rebuilds the grouping from the store, pruning orphans.
    ///
    /// Records missing `id` or the `folderId` field are dropped with a
    /// warning. Notes whose folder is not in `existing_folders` are
    /// excluded and deleted from the store fire-and-forget; a failed orphan
    /// delete is logged and never blocks the load. A store-level failure
    /// leaves the grouping empty and propagates.
    pub fn load_all(
        &mut self,
        existing_folders: &HashSet<FolderId>,
    ) -> Result<(), NoteCollectionError> {
        self.groups.clear();
        self.just_created = None;

        let records = self.store.get_all(Collection::Notes)?;
        let fallback = now_ms();
        let mut pruned = 0usize;
        for record in &records {
            let note = match Note::from_record(record, fallback) {
                Ok(note) => note,
                Err(err) => {
                    warn!("event=note_load module=notes status=record_skipped error={err}");
                    continue;
                }
            };

            if let Some(folder_id) = note.folder_id {
                if !existing_folders.contains(&folder_id) {
                    pruned += 1;
                    warn!(
                        "event=note_load module=notes status=orphan_pruned note={} folder={folder_id}",
                        note.id
                    );
                    if let Err(err) = self.store.delete(Collection::Notes, &note.id.to_string()) {
                        warn!(
                            "event=note_load module=notes status=orphan_delete_failed note={} error={err}",
                            note.id
                        );
                    }
                    continue;
                }
            }
            self.groups.entry(note.folder_id).or_default().push(note);
        }

        for group in self.groups.values_mut() {
            sort_group(group);
        }
        info!(
            "event=note_load module=notes status=ok groups={} pruned={pruned}",
            self.groups.len()
        );
        Ok(())
    }

    /// Creates and persists a fresh placeholder note in `folder_id`.
    ///
    /// The note is inserted at the front of its group so it is visible
    /// before the next full sort, and flagged once for a "just created"
    /// highlight. On persistence failure, no mutation.
    pub fn create(&mut self, folder_id: FolderId, now: i64) -> Result<Note, NoteCollectionError> {
        let note = Note::new(folder_id, now);
        self.store.add(Collection::Notes, &note.to_record())?;
        self.groups
            .entry(Some(folder_id))
            .or_default()
            .insert(0, note.clone());
        self.just_created = Some(note.id);
        Ok(note)
    }

    /// Returns one note, falling back to a store fetch on a cache miss.
    ///
    /// The fetched record's folder must match `folder_id`; a mismatch is a
    /// hard error. On success the record is upserted into the group.
    pub fn get(
        &mut self,
        folder_id: Option<FolderId>,
        note_id: NoteId,
    ) -> Result<Note, NoteCollectionError> {
        if let Some(note) = self
            .groups
            .get(&folder_id)
            .and_then(|group| group.iter().find(|note| note.id == note_id))
        {
            return Ok(note.clone());
        }

        let record = self
            .store
            .get(Collection::Notes, &note_id.to_string())?
            .ok_or(NoteCollectionError::NoteNotFound(note_id))?;
        let note = Note::from_record(&record, now_ms()).map_err(|err| {
            NoteCollectionError::Store(StoreError::InvalidRecord {
                collection: Collection::Notes,
                message: err.to_string(),
            })
        })?;
        if note.folder_id != folder_id {
            return Err(NoteCollectionError::FolderMismatch {
                note_id,
                expected: folder_id,
                actual: note.folder_id,
            });
        }

        let group = self.groups.entry(folder_id).or_default();
        group.retain(|cached| cached.id != note.id);
        group.push(note.clone());
        sort_group(group);
        Ok(note)
    }

    /// Persists new title/content for one note.
    ///
    /// The effective title (trimmed, placeholder when empty) and content
    /// are compared against the cached snapshot first; an identical pair is
    /// reported as [`SaveOutcome::Unchanged`] without touching the store or
    /// `updated_at`. On persistence failure the cache is untouched so the
    /// caller can keep the editor in a retry state.
    pub fn save(
        &mut self,
        note_id: NoteId,
        new_title: &str,
        new_content: &str,
        now: i64,
    ) -> Result<SaveOutcome, NoteCollectionError> {
        let folder_key = self
            .folder_of(note_id)
            .ok_or(NoteCollectionError::NoteNotFound(note_id))?;
        let Some(group) = self.groups.get_mut(&folder_key) else {
            return Err(NoteCollectionError::NoteNotFound(note_id));
        };
        let Some(position) = group.iter().position(|note| note.id == note_id) else {
            return Err(NoteCollectionError::NoteNotFound(note_id));
        };

        let title = effective_title(new_title);
        let current = &group[position];
        if current.title == title && current.content == new_content {
            return Ok(SaveOutcome::Unchanged);
        }

        let mut updated = current.clone();
        updated.title = title;
        updated.content = new_content.to_string();
        updated.updated_at = now;

        self.store.put(Collection::Notes, &updated.to_record())?;
        group[position] = updated.clone();
        sort_group(group);
        Ok(SaveOutcome::Saved(updated))
    }

    /// Deletes one note. Returns false for the in-flight no-op case.
    pub fn delete(
        &mut self,
        folder_id: Option<FolderId>,
        note_id: NoteId,
    ) -> Result<bool, NoteCollectionError> {
        if self.deleting.contains(&note_id) {
            return Ok(false);
        }
        self.deleting.insert(note_id);
        let result = self.store.delete(Collection::Notes, &note_id.to_string());
        self.deleting.remove(&note_id);
        result?;

        if let Some(group) = self.groups.get_mut(&folder_id) {
            group.retain(|note| note.id != note_id);
        }
        Ok(true)
    }

    /// Resets the grouping to the well-defined empty state.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.just_created = None;
    }

    /// Drops the cached groups of folders removed by a cascade.
    pub fn remove_groups(&mut self, folder_ids: &[FolderId]) {
        for folder_id in folder_ids {
            self.groups.remove(&Some(*folder_id));
        }
    }

    pub fn notes_in(&self, folder_id: Option<FolderId>) -> &[Note] {
        self.groups
            .get(&folder_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Folder key owning `note_id`, when cached.
    pub fn folder_of(&self, note_id: NoteId) -> Option<Option<FolderId>> {
        self.groups.iter().find_map(|(key, group)| {
            group
                .iter()
                .any(|note| note.id == note_id)
                .then_some(*key)
        })
    }

    /// One-shot "just created" highlight flag, consumed on read.
    pub fn take_just_created(&mut self) -> Option<NoteId> {
        self.just_created.take()
    }
}

fn sort_group(group: &mut [Note]) {
    group.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
}

/// Derives a bounded plain-text snippet for list rendering.
///
/// Embedded-image reference markers are elided and whitespace collapsed;
/// the stored content itself stays opaque to this core.
pub fn preview_text(content: &str) -> Option<String> {
    let without_images = IMAGE_MARKER_RE.replace_all(content, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_images, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::preview_text;

    #[test]
    fn preview_elides_image_markers() {
        let text = preview_text("before ![pasted](blob:abc123) after").unwrap();
        assert_eq!(text, "before after");
    }

    #[test]
    fn preview_collapses_whitespace_and_caps_length() {
        let source = format!("line one\n\n  line two {}", "x".repeat(200));
        let text = preview_text(&source).unwrap();
        assert!(text.starts_with("line one line two"));
        assert!(text.chars().count() <= 100);
    }

    #[test]
    fn preview_of_marker_only_content_is_none() {
        assert_eq!(preview_text("![img](blob:only)"), None);
        assert_eq!(preview_text("   "), None);
    }
}
