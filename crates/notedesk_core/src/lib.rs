//! Core domain logic for notedesk.
//! This crate is the single source of truth for the folder/note data model
//! and its local persistence.

pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::folder::{Folder, FolderId};
pub use model::note::{Note, NoteId, UNTITLED_TITLE};
pub use service::editor::{EditorBuffer, EditorSession, EditorState};
pub use service::folders::{CascadeOutcome, FolderTree, FolderTreeError};
pub use service::notes::{
    preview_text, NoteCollection, NoteCollectionError, SaveOutcome,
};
pub use service::workspace::{EventSink, Notifier, Workspace, WorkspaceError, WorkspaceEvent};
pub use store::{
    Collection, DurableStore, IndexDeleteOutcome, IndexKey, SqliteStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
