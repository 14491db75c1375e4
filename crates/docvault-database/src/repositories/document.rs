//! Document repository — the document half of the namespace store.

use sqlx::PgPool;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::{DocumentId, FolderId};
use docvault_entity::document::model::{CreateDocument, Document};

use super::folder::{begin, commit, insert_owner_permission};

/// Repository for document CRUD operations.
///
/// Documents have no descendants, so renames and moves are single-row
/// updates with no path propagation.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Create a new document repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a document by ID.
    pub async fn find_by_id(&self, id: DocumentId) -> AppResult<Option<Document>> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find document", e))
    }

    /// Create a document, its owner's EDIT permission, and the initial
    /// empty version 1 in one transaction.
    pub async fn create(&self, data: &CreateDocument) -> AppResult<Document> {
        let mut tx = begin(&self.pool).await?;

        if let Some(parent) = data.parent_id {
            ensure_folder_exists(&mut tx, parent).await?;
        }

        let document = sqlx::query_as::<_, Document>(
            "INSERT INTO documents (owner_id, parent_id, created_by, file_type, name) \
             VALUES ($1, $2, $1, $3, $4) RETURNING *",
        )
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(&data.file_type)
        .bind(&data.name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create document", e))?;

        insert_owner_permission(&mut tx, Some(document.id), None, data.owner_id).await?;

        sqlx::query(
            "INSERT INTO versions (document_id, author_id, version_number, content) \
             VALUES ($1, $2, 1, NULL)",
        )
        .bind(document.id)
        .bind(data.owner_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create initial version", e)
        })?;

        commit(tx).await?;
        Ok(document)
    }

    /// Rename a document.
    pub async fn rename(&self, document_id: DocumentId, new_name: &str) -> AppResult<Document> {
        sqlx::query_as::<_, Document>(
            "UPDATE documents SET name = $2, modified_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(document_id)
        .bind(new_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename document", e))?
        .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))
    }

    /// Move a document to a new parent folder.
    pub async fn move_document(
        &self,
        document_id: DocumentId,
        new_parent_id: Option<FolderId>,
    ) -> AppResult<Document> {
        let mut tx = begin(&self.pool).await?;

        if let Some(parent) = new_parent_id {
            ensure_folder_exists(&mut tx, parent).await?;
        }

        let document = sqlx::query_as::<_, Document>(
            "UPDATE documents SET parent_id = $2, modified_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(document_id)
        .bind(new_parent_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move document", e))?
        .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;

        commit(tx).await?;
        Ok(document)
    }

    /// Delete a document. With `cascade` its versions and comments go in
    /// the same transaction; without it they are left behind.
    pub async fn delete(&self, document_id: DocumentId, cascade: bool) -> AppResult<bool> {
        if !cascade {
            let result = sqlx::query("DELETE FROM documents WHERE id = $1")
                .bind(document_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete document", e)
                })?;
            return Ok(result.rows_affected() > 0);
        }

        let mut tx = begin(&self.pool).await?;

        sqlx::query("DELETE FROM versions WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete versions", e)
            })?;
        sqlx::query("DELETE FROM comments WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete comments", e)
            })?;
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete document", e)
            })?;

        commit(tx).await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn ensure_folder_exists(
    tx: &mut sqlx::Transaction<'static, sqlx::Postgres>,
    folder_id: FolderId,
) -> AppResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM folders WHERE id = $1)")
        .bind(folder_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check folder", e))?;

    if !exists {
        return Err(AppError::not_found(format!("Folder {folder_id} not found")));
    }
    Ok(())
}
