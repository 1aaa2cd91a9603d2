//! Editor session buffer.
//!
//! # Responsibility
//! - Hold the single working copy of the note currently open for editing.
//! - Derive dirty state by value comparison against the last persisted
//!   snapshot.
//!
//! # Invariants
//! - Dirtiness is recomputed from field values, never tracked as a
//!   "touched" flag, so exact reversion to the original values reads as
//!   clean.
//! - The buffer and the cached canonical record are independent copies
//!   until a save replaces the snapshot.

use crate::model::folder::FolderId;
use crate::model::note::{effective_title, Note, NoteId};
use serde::Serialize;

/// Observable editor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorState {
    /// No note open.
    Empty,
    /// Buffer matches the persisted snapshot.
    Clean,
    /// Buffer differs from the persisted snapshot in title or content.
    Dirty,
}

/// Working copy of the open note, exposed to rendering layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorBuffer {
    pub note_id: NoteId,
    pub folder_id: Option<FolderId>,
    pub title: String,
    pub content: String,
}

#[derive(Debug)]
struct OpenNote {
    buffer: EditorBuffer,
    snapshot_title: String,
    snapshot_content: String,
}

/// Session-long editor buffer; starts and returns to `Empty`.
#[derive(Debug, Default)]
pub struct EditorSession {
    open: Option<OpenNote>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `note`, replacing any previous buffer with a fresh copy.
    pub fn open(&mut self, note: &Note) {
        self.open = Some(OpenNote {
            buffer: EditorBuffer {
                note_id: note.id,
                folder_id: note.folder_id,
                title: note.title.clone(),
                content: note.content.clone(),
            },
            snapshot_title: note.title.clone(),
            snapshot_content: note.content.clone(),
        });
    }

    /// Drops the buffer (deselect, delete-success, or confirmed discard).
    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn state(&self) -> EditorState {
        match &self.open {
            None => EditorState::Empty,
            Some(open) => {
                let clean = effective_title(&open.buffer.title) == open.snapshot_title
                    && open.buffer.content == open.snapshot_content;
                if clean {
                    EditorState::Clean
                } else {
                    EditorState::Dirty
                }
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.state() == EditorState::Dirty
    }

    pub fn note_id(&self) -> Option<NoteId> {
        self.open.as_ref().map(|open| open.buffer.note_id)
    }

    pub fn folder_id(&self) -> Option<Option<FolderId>> {
        self.open.as_ref().map(|open| open.buffer.folder_id)
    }

    pub fn buffer(&self) -> Option<&EditorBuffer> {
        self.open.as_ref().map(|open| &open.buffer)
    }

    /// Updates the buffered title. Returns false when no note is open.
    pub fn set_title(&mut self, value: &str) -> bool {
        match &mut self.open {
            Some(open) => {
                open.buffer.title = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Updates the buffered content. Returns false when no note is open.
    pub fn set_content(&mut self, value: &str) -> bool {
        match &mut self.open {
            Some(open) => {
                open.buffer.content = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Replaces the snapshot after a successful save of the open note.
    pub fn mark_saved(&mut self, note: &Note) {
        if let Some(open) = &mut self.open {
            if open.buffer.note_id == note.id {
                open.buffer.title = note.title.clone();
                open.buffer.content = note.content.clone();
                open.snapshot_title = note.title.clone();
                open.snapshot_content = note.content.clone();
            }
        }
    }
}
