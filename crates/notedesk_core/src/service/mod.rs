//! In-memory managers and the workspace facade.
//!
//! # Responsibility
//! - Own the cached folder/note state and keep it synchronized with the
//!   durable store.
//! - Keep UI layers decoupled from storage details.
//!
//! # Invariants
//! - Memory is mutated only after the corresponding store operation
//!   succeeds; failures leave the cache at the last known-good state.

pub mod editor;
pub mod folders;
pub mod notes;
pub mod workspace;
