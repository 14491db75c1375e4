//! Version repository — the append-only version store.
//!
//! Every mutation takes a `FOR UPDATE` lock on the owning document row
//! first, so concurrent appends (and deletes racing appends) serialize per
//! document and version numbers are never duplicated or skipped.

use sqlx::{PgPool, Postgres, Transaction};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::{DocumentId, UserId, VersionId};
use docvault_entity::version::model::{Version, VersionSummary};

use super::folder::{begin, commit};

/// Repository for the per-document append-only version log.
#[derive(Debug, Clone)]
pub struct VersionRepository {
    pool: PgPool,
}

impl VersionRepository {
    /// Create a new version repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a version by ID.
    pub async fn find_by_id(&self, id: VersionId) -> AppResult<Option<Version>> {
        sqlx::query_as::<_, Version>("SELECT * FROM versions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find version", e))
    }

    /// Append a new version and update the document's cached size, in one
    /// transaction under the document row lock.
    pub async fn append(
        &self,
        document_id: DocumentId,
        author_id: UserId,
        content: &[u8],
    ) -> AppResult<Version> {
        let mut tx = begin(&self.pool).await?;
        let version = append_in_tx(&mut tx, document_id, author_id, content).await?;
        commit(tx).await?;
        Ok(version)
    }

    /// Content of the latest version; absent content reads as empty.
    pub async fn latest_content(&self, document_id: DocumentId) -> AppResult<Vec<u8>> {
        let version = sqlx::query_as::<_, Version>(
            "SELECT * FROM versions WHERE document_id = $1 \
             ORDER BY version_number DESC LIMIT 1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read latest version", e))?
        .ok_or_else(|| {
            AppError::not_found(format!("Document {document_id} has no versions"))
        })?;

        Ok(version.content_bytes().to_vec())
    }

    /// Version history, newest first, without content payloads.
    pub async fn history(&self, document_id: DocumentId) -> AppResult<Vec<VersionSummary>> {
        sqlx::query_as::<_, VersionSummary>(
            "SELECT id, version_number, author_id, created_at FROM versions \
             WHERE document_id = $1 ORDER BY version_number DESC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list versions", e))
    }

    /// Append a copy of an earlier version's content as the new latest
    /// version. History is only ever extended, never rewritten.
    pub async fn revert_to(&self, version_id: VersionId, author_id: UserId) -> AppResult<Version> {
        let mut tx = begin(&self.pool).await?;

        let target = sqlx::query_as::<_, Version>("SELECT * FROM versions WHERE id = $1")
            .bind(version_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load version", e))?
            .ok_or_else(|| AppError::not_found(format!("Version {version_id} not found")))?;

        let content = target.content_bytes().to_vec();
        let version = append_in_tx(&mut tx, target.document_id, author_id, &content).await?;

        commit(tx).await?;
        Ok(version)
    }

    /// Delete a non-latest version, leaving a gap in the numbering.
    /// Deleting the current tip is rejected.
    pub async fn delete(&self, version_id: VersionId) -> AppResult<()> {
        let mut tx = begin(&self.pool).await?;

        let target = sqlx::query_as::<_, Version>("SELECT * FROM versions WHERE id = $1")
            .bind(version_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load version", e))?
            .ok_or_else(|| AppError::not_found(format!("Version {version_id} not found")))?;

        lock_document(&mut tx, target.document_id).await?;

        let latest: Option<i32> =
            sqlx::query_scalar("SELECT MAX(version_number) FROM versions WHERE document_id = $1")
                .bind(target.document_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to read latest number", e)
                })?;

        if latest == Some(target.version_number) {
            return Err(AppError::invalid_operation(
                "Cannot delete the latest version of a document",
            ));
        }

        sqlx::query("DELETE FROM versions WHERE id = $1")
            .bind(version_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete version", e)
            })?;

        commit(tx).await?;
        Ok(())
    }
}

/// Lock a document row, failing with `NotFound` if it does not exist.
async fn lock_document(
    tx: &mut Transaction<'static, Postgres>,
    document_id: DocumentId,
) -> AppResult<()> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM documents WHERE id = $1 FOR UPDATE")
        .bind(document_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock document", e))?
        .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;
    Ok(())
}

/// The shared append step: lock the document, compute `max + 1`, insert,
/// and refresh the cached size.
async fn append_in_tx(
    tx: &mut Transaction<'static, Postgres>,
    document_id: DocumentId,
    author_id: UserId,
    content: &[u8],
) -> AppResult<Version> {
    lock_document(tx, document_id).await?;

    let next: i32 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(version_number), 0) + 1 FROM versions WHERE document_id = $1",
    )
    .bind(document_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| {
        AppError::with_source(ErrorKind::Database, "Failed to compute next version number", e)
    })?;

    let version = sqlx::query_as::<_, Version>(
        "INSERT INTO versions (document_id, author_id, version_number, content) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(document_id)
    .bind(author_id)
    .bind(next)
    .bind(content)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append version", e))?;

    sqlx::query("UPDATE documents SET size_bytes = $2, modified_at = NOW() WHERE id = $1")
        .bind(document_id)
        .bind(content.len() as i64)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update document size", e)
        })?;

    Ok(version)
}
