//! Folder/document namespace operations with the authorization gate.

use std::sync::Arc;

use tracing::info;

use docvault_core::config::namespace::NamespaceConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::{DocumentId, FolderId};
use docvault_database::repositories::document::DocumentRepository;
use docvault_database::repositories::folder::FolderRepository;
use docvault_entity::document::model::{CreateDocument, Document};
use docvault_entity::folder::content::FolderEntry;
use docvault_entity::folder::model::{CreateFolder, Folder};
use docvault_entity::permission::{Ability, ResourceRef};

use crate::context::RequestContext;
use crate::gate::PermissionGate;

/// Manages the folder/document namespace.
#[derive(Debug, Clone)]
pub struct NamespaceService {
    /// Folder repository.
    folder_repo: Arc<FolderRepository>,
    /// Document repository.
    document_repo: Arc<DocumentRepository>,
    /// Authorization gate.
    gate: PermissionGate,
    /// Deletion policy.
    policy: NamespaceConfig,
}

/// Request to create a new folder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateFolderRequest {
    /// Parent folder ID (None for the root).
    pub parent_id: Option<FolderId>,
    /// Folder name.
    pub name: String,
}

/// Request to create a new document.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateDocumentRequest {
    /// Parent folder ID (None for the root).
    pub parent_id: Option<FolderId>,
    /// Document name.
    pub name: String,
    /// Document type label.
    pub file_type: String,
}

impl NamespaceService {
    /// Creates a new namespace service.
    pub fn new(
        folder_repo: Arc<FolderRepository>,
        document_repo: Arc<DocumentRepository>,
        gate: PermissionGate,
        policy: NamespaceConfig,
    ) -> Self {
        Self {
            folder_repo,
            document_repo,
            gate,
            policy,
        }
    }

    /// Creates a new folder owned by the acting principal.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        validate_name(&req.name)?;

        if let Some(parent) = req.parent_id {
            self.gate
                .require_edit(ctx, ResourceRef::Folder(parent))
                .await?;
        }

        let folder = self
            .folder_repo
            .create(&CreateFolder {
                parent_id: req.parent_id,
                name: req.name,
                owner_id: ctx.user_id,
            })
            .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            name = %folder.name,
            "Folder created"
        );

        Ok(folder)
    }

    /// Creates a new document owned by the acting principal, with its
    /// empty initial version.
    pub async fn create_document(
        &self,
        ctx: &RequestContext,
        req: CreateDocumentRequest,
    ) -> AppResult<Document> {
        validate_name(&req.name)?;

        if let Some(parent) = req.parent_id {
            self.gate
                .require_edit(ctx, ResourceRef::Folder(parent))
                .await?;
        }

        let document = self
            .document_repo
            .create(&CreateDocument {
                parent_id: req.parent_id,
                name: req.name,
                file_type: req.file_type,
                owner_id: ctx.user_id,
            })
            .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %document.id,
            name = %document.name,
            "Document created"
        );

        Ok(document)
    }

    /// Renames a folder; cached paths of the whole subtree follow.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_name: &str,
    ) -> AppResult<Folder> {
        validate_name(new_name)?;
        self.gate
            .require_edit(ctx, ResourceRef::Folder(folder_id))
            .await?;

        let folder = self.folder_repo.rename(folder_id, new_name).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            new_name = %new_name,
            "Folder renamed"
        );

        Ok(folder)
    }

    /// Renames a document.
    pub async fn rename_document(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
        new_name: &str,
    ) -> AppResult<Document> {
        validate_name(new_name)?;
        self.gate
            .require_edit(ctx, ResourceRef::Document(document_id))
            .await?;

        let document = self.document_repo.rename(document_id, new_name).await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %document_id,
            new_name = %new_name,
            "Document renamed"
        );

        Ok(document)
    }

    /// Moves a folder under a new parent. Moving a folder under itself or
    /// one of its own descendants is rejected.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_parent_id: Option<FolderId>,
    ) -> AppResult<Folder> {
        self.gate
            .require_edit(ctx, ResourceRef::Folder(folder_id))
            .await?;
        if let Some(target) = new_parent_id {
            self.gate
                .require_edit(ctx, ResourceRef::Folder(target))
                .await?;
        }

        let folder = self.folder_repo.move_folder(folder_id, new_parent_id).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            new_parent = ?new_parent_id,
            "Folder moved"
        );

        Ok(folder)
    }

    /// Moves a document to a new parent folder.
    pub async fn move_document(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
        new_parent_id: Option<FolderId>,
    ) -> AppResult<Document> {
        self.gate
            .require_edit(ctx, ResourceRef::Document(document_id))
            .await?;
        if let Some(target) = new_parent_id {
            self.gate
                .require_edit(ctx, ResourceRef::Folder(target))
                .await?;
        }

        let document = self
            .document_repo
            .move_document(document_id, new_parent_id)
            .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %document_id,
            new_parent = ?new_parent_id,
            "Document moved"
        );

        Ok(document)
    }

    /// The cached path of a folder; the root sentinel has the empty path.
    pub async fn get_path(
        &self,
        ctx: &RequestContext,
        folder_id: Option<FolderId>,
    ) -> AppResult<String> {
        if let Some(folder_id) = folder_id {
            self.gate
                .require(ctx, ResourceRef::Folder(folder_id), Ability::View)
                .await?;
        }
        self.folder_repo.get_path(folder_id).await
    }

    /// Lists the folders and documents under a parent that the acting
    /// principal can view, merged and sorted by name.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        parent_id: Option<FolderId>,
    ) -> AppResult<Vec<FolderEntry>> {
        self.folder_repo.list_entries(parent_id, ctx.user_id).await
    }

    /// Deletes a folder under the configured cascade policy.
    pub async fn delete_folder(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<()> {
        self.gate
            .require_edit(ctx, ResourceRef::Folder(folder_id))
            .await?;

        let deleted = self
            .folder_repo
            .delete(folder_id, self.policy.cascade_delete)
            .await?;
        if !deleted {
            return Err(AppError::not_found(format!("Folder {folder_id} not found")));
        }

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            cascade = self.policy.cascade_delete,
            "Folder deleted"
        );

        Ok(())
    }

    /// Deletes a document under the configured cascade policy.
    pub async fn delete_document(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
    ) -> AppResult<()> {
        self.gate
            .require_edit(ctx, ResourceRef::Document(document_id))
            .await?;

        let deleted = self
            .document_repo
            .delete(document_id, self.policy.cascade_delete)
            .await?;
        if !deleted {
            return Err(AppError::not_found(format!(
                "Document {document_id} not found"
            )));
        }

        info!(
            user_id = %ctx.user_id,
            document_id = %document_id,
            cascade = self.policy.cascade_delete,
            "Document deleted"
        );

        Ok(())
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if name.contains('/') {
        return Err(AppError::validation("Name cannot contain '/'"));
    }
    Ok(())
}
