//! Core data models for notelist.
//!
//! These types are shared across all notelist crates and represent
//! the core domain entities.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A note stored in exactly one note list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub list_id: i32,
}

/// Payload for creating a note. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub name: String,
    pub description: String,
    pub list_id: i32,
}

impl NewNote {
    pub fn new(name: impl Into<String>, description: impl Into<String>, list_id: i32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            list_id,
        }
    }

    /// The note this payload becomes once the store assigned `id`.
    pub fn into_note(self, id: i32) -> Note {
        Note {
            id,
            name: self.name,
            description: self.description,
            list_id: self.list_id,
        }
    }
}

// =============================================================================
// LIST & PERMISSION TYPES
// =============================================================================

/// A named group of notes. Provisioned outside of this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteList {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// Grants `favored` access to every note of list `list_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct PermissionGrant {
    pub list_id: i32,
    pub favored: String,
}

// =============================================================================
// AUTHORIZATION
// =============================================================================

/// The set of identities a caller presents with every repository call.
///
/// An operation on a list is allowed when at least one of these identities
/// appears as a [`PermissionGrant::favored`] for that list. The empty set
/// authorizes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationSet(BTreeSet<String>);

impl AuthorizationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identity: impl Into<String>) -> bool {
        self.0.insert(identity.into())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.0.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Identities as an owned vector, suitable for binding as `text[]`.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Whether any identity is among the given grants for `list_id`.
    pub fn permits<'a>(
        &self,
        list_id: i32,
        grants: impl IntoIterator<Item = &'a PermissionGrant>,
    ) -> bool {
        grants
            .into_iter()
            .any(|g| g.list_id == list_id && self.contains(&g.favored))
    }
}

impl<S: Into<String>> FromIterator<S> for AuthorizationSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for AuthorizationSet {
    fn from(identities: [S; N]) -> Self {
        identities.into_iter().collect()
    }
}

impl From<Vec<String>> for AuthorizationSet {
    fn from(identities: Vec<String>) -> Self {
        identities.into_iter().collect()
    }
}
