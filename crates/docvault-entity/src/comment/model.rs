//! Document comment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{CommentId, DocumentId, UserId};

/// A comment posted on a document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    /// Unique comment identifier.
    pub id: CommentId,
    /// The commented document.
    pub document_id: DocumentId,
    /// The comment author.
    pub created_by: UserId,
    /// Comment text.
    pub content: String,
    /// When the comment was posted.
    pub posted_at: DateTime<Utc>,
}
