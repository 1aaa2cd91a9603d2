//! Workspace facade.
//!
//! # Responsibility
//! - Compose the folder forest, note grouping and editor buffer over one
//!   shared store and expose the outward command/query interface.
//! - Route user-visible failures and confirmation prompts through the
//!   injected notifier; emit change events through the injected sink.
//!
//! # Invariants
//! - Collaborators are injected at construction; no per-call existence
//!   checks.
//! - Navigation out of a dirty editor requires a confirmed discard;
//!   declining aborts the attempted transition with no side effects.
//! - Every command failure is surfaced to the notifier and returned to the
//!   caller; no error escapes uncaught past this layer.

use crate::model::folder::{Folder, FolderId};
use crate::model::note::{Note, NoteId};
use crate::model::now_ms;
use crate::service::editor::{EditorBuffer, EditorSession, EditorState};
use crate::service::folders::{CascadeOutcome, FolderTree, FolderTreeError};
use crate::service::notes::{NoteCollection, NoteCollectionError, SaveOutcome};
use crate::store::DurableStore;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Outward change notifications for rendering layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WorkspaceEvent {
    FolderListChanged,
    NoteListChanged {
        folder_id: Option<FolderId>,
    },
    EditorStateChanged {
        state: EditorState,
        buffer: Option<EditorBuffer>,
    },
}

/// Receives workspace change events.
pub trait EventSink {
    fn emit(&self, event: WorkspaceEvent);
}

/// Blocking user notification and confirmation surface.
pub trait Notifier {
    /// Shows a blocking notice naming the failed operation.
    fn alert(&self, message: &str);
    /// Asks a yes/no question; false aborts the pending action.
    fn confirm(&self, message: &str) -> bool;
}

/// Errors surfaced by workspace commands.
#[derive(Debug)]
pub enum WorkspaceError {
    /// A note command requires a selected folder.
    NoFolderSelected,
    /// Selection referenced an unknown folder.
    FolderNotFound(FolderId),
    Folders(FolderTreeError),
    Notes(NoteCollectionError),
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFolderSelected => write!(f, "no folder is selected"),
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::Folders(err) => write!(f, "{err}"),
            Self::Notes(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Folders(err) => Some(err),
            Self::Notes(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FolderTreeError> for WorkspaceError {
    fn from(value: FolderTreeError) -> Self {
        Self::Folders(value)
    }
}

impl From<NoteCollectionError> for WorkspaceError {
    fn from(value: NoteCollectionError) -> Self {
        Self::Notes(value)
    }
}

/// Facade over the managers; the single entry point for UI collaborators.
pub struct Workspace<S: DurableStore> {
    folders: FolderTree<S>,
    notes: NoteCollection<S>,
    editor: EditorSession,
    notifier: Arc<dyn Notifier>,
    events: Arc<dyn EventSink>,
}

impl<S: DurableStore> Workspace<S> {
    pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>, events: Arc<dyn EventSink>) -> Self {
        Self {
            folders: FolderTree::new(Arc::clone(&store)),
            notes: NoteCollection::new(store),
            editor: EditorSession::new(),
            notifier,
            events,
        }
    }

    /// Loads both collections and cross-validates them.
    ///
    /// Folder load runs first; the surviving folder ids drive orphan
    /// reconciliation of the notes. On failure both caches are left in a
    /// well-defined empty state.
    pub fn load(&mut self) -> Result<(), WorkspaceError> {
        let loaded = self.folders.load_all();
        if let Err(err) = loaded {
            self.notes.clear();
            self.editor.close();
            return self.fail("load folders", err);
        }

        let folder_ids = self.folders.folder_ids();
        let loaded = self.notes.load_all(&folder_ids);
        if let Err(err) = loaded {
            return self.fail("load notes", err);
        }

        self.editor.close();
        self.events.emit(WorkspaceEvent::FolderListChanged);
        self.emit_editor();
        Ok(())
    }

    // ----- queries -------------------------------------------------------

    pub fn folders(&self) -> &[Folder] {
        self.folders.folders()
    }

    pub fn notes_in(&self, folder_id: Option<FolderId>) -> &[Note] {
        self.notes.notes_in(folder_id)
    }

    /// Returns one note by id within the given folder scope, falling back
    /// to a store fetch on a cache miss. A missing note or a folder
    /// mismatch forces the editor back to a safe deselected state.
    pub fn note(
        &mut self,
        folder_id: Option<FolderId>,
        note_id: NoteId,
    ) -> Result<Note, WorkspaceError> {
        match self.notes.get(folder_id, note_id) {
            Ok(note) => Ok(note),
            Err(err @ NoteCollectionError::NoteNotFound(_))
            | Err(err @ NoteCollectionError::FolderMismatch { .. }) => {
                self.editor.close();
                self.emit_editor();
                self.fail("open note", err)
            }
            Err(err) => self.fail("open note", err),
        }
    }

    pub fn selected_folder(&self) -> Option<FolderId> {
        self.folders.selected()
    }

    pub fn selected_note(&self) -> Option<NoteId> {
        self.editor.note_id()
    }

    pub fn editor_state(&self) -> EditorState {
        self.editor.state()
    }

    pub fn editor_buffer(&self) -> Option<&EditorBuffer> {
        self.editor.buffer()
    }

    pub fn is_expanded(&self, folder_id: FolderId) -> bool {
        self.folders.is_expanded(folder_id)
    }

    /// One-shot "just created" highlight flag, consumed on read.
    pub fn take_just_created(&mut self) -> Option<NoteId> {
        self.notes.take_just_created()
    }

    // ----- commands ------------------------------------------------------

    /// Creates a folder under an optional parent.
    pub fn create_folder(
        &mut self,
        name: &str,
        parent_id: Option<FolderId>,
    ) -> Result<Folder, WorkspaceError> {
        let result = self.folders.create(name, parent_id, now_ms());
        match result {
            Ok(folder) => {
                self.events.emit(WorkspaceEvent::FolderListChanged);
                Ok(folder)
            }
            Err(err) => self.fail("create folder", err),
        }
    }

    /// Changes the selected folder. Returns false when nothing changed
    /// (same folder, or the user kept their unsaved edits).
    pub fn select_folder(&mut self, folder_id: Option<FolderId>) -> Result<bool, WorkspaceError> {
        if folder_id == self.folders.selected() {
            return Ok(false);
        }
        if let Some(id) = folder_id {
            if !self.folders.contains(id) {
                return self.fail("select folder", WorkspaceError::FolderNotFound(id));
            }
        }
        if !self.resolve_dirty_editor() {
            return Ok(false);
        }

        self.folders.select(folder_id);
        self.editor.close();
        self.events.emit(WorkspaceEvent::FolderListChanged);
        self.events.emit(WorkspaceEvent::NoteListChanged { folder_id });
        self.emit_editor();
        Ok(true)
    }

    /// Opens a note from the selected folder in the editor. Returns false
    /// when the user kept their unsaved edits.
    pub fn select_note(&mut self, note_id: NoteId) -> Result<bool, WorkspaceError> {
        if self.editor.note_id() == Some(note_id) {
            return Ok(false);
        }
        if !self.resolve_dirty_editor() {
            return Ok(false);
        }

        let folder_id = self.folders.selected();
        let note = self.note(folder_id, note_id)?;
        self.editor.open(&note);
        self.emit_editor();
        Ok(true)
    }

    /// Creates a placeholder note in the selected folder and opens it.
    ///
    /// Returns `Ok(None)` when the user kept their unsaved edits.
    pub fn create_note(&mut self) -> Result<Option<Note>, WorkspaceError> {
        let Some(folder_id) = self.folders.selected() else {
            return self.fail("create note", WorkspaceError::NoFolderSelected);
        };
        if !self.resolve_dirty_editor() {
            return Ok(None);
        }

        let result = self.notes.create(folder_id, now_ms());
        match result {
            Ok(note) => {
                self.editor.open(&note);
                self.events.emit(WorkspaceEvent::NoteListChanged {
                    folder_id: Some(folder_id),
                });
                self.emit_editor();
                Ok(Some(note))
            }
            Err(err) => self.fail("create note", err),
        }
    }

    /// Persists new title/content for one note.
    pub fn save_note(
        &mut self,
        note_id: NoteId,
        title: &str,
        content: &str,
    ) -> Result<SaveOutcome, WorkspaceError> {
        let result = self.notes.save(note_id, title, content, now_ms());
        match result {
            Ok(SaveOutcome::Saved(note)) => {
                self.editor.mark_saved(&note);
                self.events.emit(WorkspaceEvent::NoteListChanged {
                    folder_id: note.folder_id,
                });
                self.emit_editor();
                Ok(SaveOutcome::Saved(note))
            }
            Ok(SaveOutcome::Unchanged) => Ok(SaveOutcome::Unchanged),
            Err(err) => self.fail("save note", err),
        }
    }

    /// Saves whatever is in the editor buffer.
    pub fn save_editor(&mut self) -> Result<SaveOutcome, WorkspaceError> {
        let Some(buffer) = self.editor.buffer().cloned() else {
            return Ok(SaveOutcome::Unchanged);
        };
        self.save_note(buffer.note_id, &buffer.title, &buffer.content)
    }

    /// Deletes one note after confirmation. Returns false when the user
    /// declined or a deletion for this note is already in flight.
    pub fn delete_note(&mut self, note_id: NoteId) -> Result<bool, WorkspaceError> {
        let Some(folder_key) = self.notes.folder_of(note_id) else {
            return self.fail("delete note", NoteCollectionError::NoteNotFound(note_id));
        };
        if !self.notifier.confirm("Delete this note?") {
            return Ok(false);
        }

        let result = self.notes.delete(folder_key, note_id);
        match result {
            Ok(false) => Ok(false),
            Ok(true) => {
                if self.editor.note_id() == Some(note_id) {
                    self.editor.close();
                    self.emit_editor();
                }
                self.events.emit(WorkspaceEvent::NoteListChanged {
                    folder_id: folder_key,
                });
                Ok(true)
            }
            Err(err) => self.fail("delete note", err),
        }
    }

    /// Deletes a folder with its whole subtree after confirmation.
    ///
    /// Per-item failures inside the cascade are reported as a warning
    /// notice, not an error; memory reflects the attempted closure.
    pub fn delete_folder(
        &mut self,
        folder_id: FolderId,
    ) -> Result<Option<CascadeOutcome>, WorkspaceError> {
        if !self.folders.contains(folder_id) {
            return Ok(None);
        }
        if !self
            .notifier
            .confirm("Delete this folder, all its subfolders and every note inside?")
        {
            return Ok(None);
        }

        let Some(outcome) = self.folders.delete(folder_id) else {
            return Ok(None);
        };
        self.notes.remove_groups(&outcome.folders);

        let open_in_closure = self
            .editor
            .folder_id()
            .flatten()
            .is_some_and(|id| outcome.folders.contains(&id))
            || self
                .editor
                .note_id()
                .is_some_and(|id| outcome.notes.contains(&id));
        if open_in_closure {
            self.editor.close();
            self.emit_editor();
        }

        if !outcome.failures.is_empty() {
            self.notifier.alert(&format!(
                "Folder deleted, but {} item(s) could not be removed from storage.",
                outcome.failures.len()
            ));
        }

        self.events.emit(WorkspaceEvent::FolderListChanged);
        for removed in &outcome.folders {
            self.events.emit(WorkspaceEvent::NoteListChanged {
                folder_id: Some(*removed),
            });
        }
        Ok(Some(outcome))
    }

    /// Flips display expansion for one folder.
    pub fn toggle_expansion(&mut self, folder_id: FolderId) -> bool {
        let expanded = self.folders.toggle_expansion(folder_id);
        self.events.emit(WorkspaceEvent::FolderListChanged);
        expanded
    }

    /// Updates the buffered title of the open note.
    pub fn edit_title(&mut self, value: &str) {
        if self.editor.set_title(value) {
            self.emit_editor();
        }
    }

    /// Updates the buffered content of the open note.
    pub fn edit_content(&mut self, value: &str) {
        if self.editor.set_content(value) {
            self.emit_editor();
        }
    }

    // ----- internals -----------------------------------------------------

    /// Gate for transitions out of a dirty editor. True means proceed
    /// (editor was clean, or the user confirmed the discard).
    fn resolve_dirty_editor(&mut self) -> bool {
        if !self.editor.is_dirty() {
            return true;
        }
        if self
            .notifier
            .confirm("Discard unsaved changes to the open note?")
        {
            self.editor.close();
            self.emit_editor();
            true
        } else {
            false
        }
    }

    fn emit_editor(&self) {
        self.events.emit(WorkspaceEvent::EditorStateChanged {
            state: self.editor.state(),
            buffer: self.editor.buffer().cloned(),
        });
    }

    fn fail<T>(
        &self,
        operation: &str,
        err: impl Into<WorkspaceError>,
    ) -> Result<T, WorkspaceError> {
        let err = err.into();
        self.notifier.alert(&format!("Could not {operation}: {err}"));
        Err(err)
    }
}
