//! Document version entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{DocumentId, UserId, VersionId};

/// One entry in a document's append-only version log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Version {
    /// Unique version identifier.
    pub id: VersionId,
    /// The document this version belongs to.
    pub document_id: DocumentId,
    /// The user who authored this version.
    pub author_id: UserId,
    /// Sequential version number, starting at 1 per document.
    pub version_number: i32,
    /// When this version was created.
    pub created_at: DateTime<Utc>,
    /// Version content; absent content reads as empty.
    pub content: Option<Vec<u8>>,
}

impl Version {
    /// The version content, with absent content normalized to empty.
    pub fn content_bytes(&self) -> &[u8] {
        self.content.as_deref().unwrap_or(&[])
    }
}

/// A version-history row; carries no content so history listings stay
/// cheap for large documents.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VersionSummary {
    /// Unique version identifier.
    pub id: VersionId,
    /// Sequential version number.
    pub version_number: i32,
    /// The user who authored this version.
    pub author_id: UserId,
    /// When this version was created.
    pub created_at: DateTime<Utc>,
}
