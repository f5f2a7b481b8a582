//! Core traits for notelist abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AuthorizationSet, NewNote, Note};

// =============================================================================
// NOTE REPOSITORY TRAITS
// =============================================================================

/// Repository for note CRUD operations gated by list permissions.
///
/// Every method re-checks `auths` against the grants of the note's list.
/// A caller without an overlapping grant observes exactly the same outcome
/// as for a row that does not exist.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a note into `note.list_id` and return its store-assigned id.
    ///
    /// Fails with [`Error::NoteListNotFound`](crate::Error::NoteListNotFound)
    /// when the list is missing or not granted to any of `auths`.
    async fn create(&self, note: NewNote, auths: &AuthorizationSet) -> Result<i32>;

    /// Fetch a note by id.
    async fn get(&self, id: i32, auths: &AuthorizationSet) -> Result<Note>;

    /// Overwrite name and description. The list of a note never changes.
    async fn update(&self, note: &Note, auths: &AuthorizationSet) -> Result<()>;

    /// Delete a note by id.
    async fn delete(&self, id: i32, auths: &AuthorizationSet) -> Result<()>;
}
