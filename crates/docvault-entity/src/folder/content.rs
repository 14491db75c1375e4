//! Merged folder-listing rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Whether a listing entry is a document or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entry_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A document entry.
    File,
    /// A folder entry.
    Folder,
}

impl EntryKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of a merged folder listing — either a child folder or a
/// contained document, sorted by name with its siblings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FolderEntry {
    /// Folder or document identifier, depending on `kind`.
    pub id: i64,
    /// Entry name.
    pub name: String,
    /// Whether this entry is a document or a folder.
    pub kind: EntryKind,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last modified.
    pub modified_at: DateTime<Utc>,
    /// Cached content size in bytes; folders report `None`.
    pub size_bytes: Option<i64>,
}
