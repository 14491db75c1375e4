//! Document version operations with the authorization gate.

use std::sync::Arc;

use tracing::info;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::{DocumentId, VersionId};
use docvault_database::repositories::version::VersionRepository;
use docvault_entity::permission::{Ability, ResourceRef};
use docvault_entity::version::model::{Version, VersionSummary};

use crate::context::RequestContext;
use crate::gate::PermissionGate;

/// Manages the per-document append-only version log.
#[derive(Debug, Clone)]
pub struct VersionService {
    /// Version repository.
    version_repo: Arc<VersionRepository>,
    /// Authorization gate.
    gate: PermissionGate,
}

impl VersionService {
    /// Creates a new version service.
    pub fn new(version_repo: Arc<VersionRepository>, gate: PermissionGate) -> Self {
        Self { version_repo, gate }
    }

    /// Appends a new version authored by the acting principal.
    pub async fn append_version(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
        content: &[u8],
    ) -> AppResult<Version> {
        self.gate
            .require_edit(ctx, ResourceRef::Document(document_id))
            .await?;

        let version = self
            .version_repo
            .append(document_id, ctx.user_id, content)
            .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %document_id,
            version = version.version_number,
            "Version appended"
        );

        Ok(version)
    }

    /// Content of the latest version; absent content reads as empty.
    pub async fn latest_content(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
    ) -> AppResult<Vec<u8>> {
        self.gate
            .require(ctx, ResourceRef::Document(document_id), Ability::View)
            .await?;
        self.version_repo.latest_content(document_id).await
    }

    /// Version history, newest first.
    pub async fn version_history(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
    ) -> AppResult<Vec<VersionSummary>> {
        self.gate
            .require(ctx, ResourceRef::Document(document_id), Ability::View)
            .await?;
        self.version_repo.history(document_id).await
    }

    /// Re-appends an earlier version's content as the new latest version.
    pub async fn revert_to(&self, ctx: &RequestContext, version_id: VersionId) -> AppResult<Version> {
        let target = self
            .version_repo
            .find_by_id(version_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Version {version_id} not found")))?;

        self.gate
            .require_edit(ctx, ResourceRef::Document(target.document_id))
            .await?;

        let version = self.version_repo.revert_to(version_id, ctx.user_id).await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %target.document_id,
            reverted_to = target.version_number,
            new_version = version.version_number,
            "Document reverted"
        );

        Ok(version)
    }

    /// Deletes a non-latest version; deleting the tip is rejected.
    pub async fn delete_version(&self, ctx: &RequestContext, version_id: VersionId) -> AppResult<()> {
        let target = self
            .version_repo
            .find_by_id(version_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Version {version_id} not found")))?;

        self.gate
            .require_edit(ctx, ResourceRef::Document(target.document_id))
            .await?;

        self.version_repo.delete(version_id).await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %target.document_id,
            version = target.version_number,
            "Version deleted"
        );

        Ok(())
    }
}
