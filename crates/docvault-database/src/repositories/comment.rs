//! Comment repository.

use sqlx::PgPool;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::{CommentId, DocumentId, UserId};
use docvault_entity::comment::model::Comment;

/// Repository for document comments.
#[derive(Debug, Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    /// Create a new comment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: CommentId) -> AppResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find comment", e))
    }

    /// All comments on a document, oldest first.
    pub async fn list_for_document(&self, document_id: DocumentId) -> AppResult<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE document_id = $1 ORDER BY posted_at ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list comments", e))
    }

    /// Post a comment on a document.
    pub async fn add(
        &self,
        document_id: DocumentId,
        author_id: UserId,
        content: &str,
    ) -> AppResult<Comment> {
        sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (document_id, created_by, content) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(document_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to add comment", e))
    }

    /// Delete a comment. Returns `true` if it existed.
    pub async fn delete(&self, comment_id: CommentId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete comment", e))?;
        Ok(result.rows_affected() > 0)
    }
}
