//! Document entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{DocumentId, FolderId, UserId};

/// A document in the namespace. Content lives in the version log; the row
/// only caches the byte length of the latest version.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    /// Unique document identifier.
    pub id: DocumentId,
    /// The document owner.
    pub owner_id: UserId,
    /// The folder containing this document (null for root-level documents).
    pub parent_id: Option<FolderId>,
    /// The user who created the document.
    pub created_by: UserId,
    /// Byte length of the latest version's content.
    pub size_bytes: i64,
    /// Document type label, e.g. `txt`.
    pub file_type: String,
    /// Document name.
    pub name: String,
    /// When the document was created.
    pub created_at: DateTime<Utc>,
    /// When the document was last modified.
    pub modified_at: DateTime<Utc>,
}

/// Data required to create a new document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    /// Containing folder (None for the root sentinel).
    pub parent_id: Option<FolderId>,
    /// Document name.
    pub name: String,
    /// Document type label.
    pub file_type: String,
    /// The document owner; also recorded as the creator.
    pub owner_id: UserId,
}
