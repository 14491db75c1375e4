//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{FolderId, UserId};

/// A folder in the document hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// The folder owner.
    pub owner_id: UserId,
    /// Parent folder ID (null for top-level folders under the root).
    pub parent_id: Option<FolderId>,
    /// The user who created the folder.
    pub created_by: UserId,
    /// Folder name.
    pub name: String,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last modified.
    pub modified_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this folder sits directly under the root sentinel.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Parent folder (None for the root sentinel).
    pub parent_id: Option<FolderId>,
    /// Folder name.
    pub name: String,
    /// The folder owner; also recorded as the creator.
    pub owner_id: UserId,
}
