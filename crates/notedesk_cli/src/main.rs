//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `notedesk_core` linkage.
//! - Exercise one create/list round trip over an in-memory store.

use notedesk_core::{EventSink, Notifier, SqliteStore, Workspace, WorkspaceEvent};
use std::process::ExitCode;
use std::sync::Arc;

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        eprintln!("! {message}");
    }

    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

struct QuietSink;

impl EventSink for QuietSink {
    fn emit(&self, _event: WorkspaceEvent) {}
}

fn smoke(workspace: &mut Workspace<SqliteStore>) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    workspace.load()?;
    let folder = workspace.create_folder("Scratch", None)?;
    workspace.select_folder(Some(folder.id))?;
    workspace.create_note()?;
    Ok((
        workspace.folders().len(),
        workspace.notes_in(Some(folder.id)).len(),
    ))
}

fn main() -> ExitCode {
    println!("notedesk_core version={}", notedesk_core::core_version());

    let log_dir = std::env::temp_dir().join("notedesk-logs");
    if let Err(err) =
        notedesk_core::init_logging(notedesk_core::default_log_level(), &log_dir.to_string_lossy())
    {
        eprintln!("logging disabled: {err}");
    }

    let store = match SqliteStore::open_in_memory() {
        Ok(store) => Arc::new(store),
        Err(err) => {
            eprintln!("failed to open store: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut workspace = Workspace::new(store, Arc::new(ConsoleNotifier), Arc::new(QuietSink));

    match smoke(&mut workspace) {
        Ok((folders, notes)) => {
            println!("smoke ok folders={folders} notes={notes}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}
