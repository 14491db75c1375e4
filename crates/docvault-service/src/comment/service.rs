//! Document comments with the authorization gate.
//!
//! Commenting requires at least the COMMENT ability — an explicit gate the
//! legacy system never had (it only checked ownership).

use std::sync::Arc;

use tracing::info;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::{CommentId, DocumentId};
use docvault_database::repositories::comment::CommentRepository;
use docvault_entity::comment::model::Comment;
use docvault_entity::permission::{Ability, ResourceRef};

use crate::context::RequestContext;
use crate::gate::PermissionGate;

/// Manages document comment threads.
#[derive(Debug, Clone)]
pub struct CommentService {
    /// Comment repository.
    comment_repo: Arc<CommentRepository>,
    /// Authorization gate.
    gate: PermissionGate,
}

impl CommentService {
    /// Creates a new comment service.
    pub fn new(comment_repo: Arc<CommentRepository>, gate: PermissionGate) -> Self {
        Self { comment_repo, gate }
    }

    /// All comments on a document, oldest first.
    pub async fn list_comments(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
    ) -> AppResult<Vec<Comment>> {
        self.gate
            .require(ctx, ResourceRef::Document(document_id), Ability::View)
            .await?;
        self.comment_repo.list_for_document(document_id).await
    }

    /// Posts a comment authored by the acting principal.
    pub async fn add_comment(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
        content: &str,
    ) -> AppResult<Comment> {
        if content.trim().is_empty() {
            return Err(AppError::validation("Comment cannot be empty"));
        }

        self.gate
            .require(ctx, ResourceRef::Document(document_id), Ability::Comment)
            .await?;

        let comment = self
            .comment_repo
            .add(document_id, ctx.user_id, content)
            .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %document_id,
            comment_id = %comment.id,
            "Comment added"
        );

        Ok(comment)
    }

    /// Deletes a comment. The author may always delete their own; anyone
    /// else needs EDIT on the document.
    pub async fn delete_comment(
        &self,
        ctx: &RequestContext,
        comment_id: CommentId,
    ) -> AppResult<()> {
        let comment = self
            .comment_repo
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Comment {comment_id} not found")))?;

        if comment.created_by != ctx.user_id {
            self.gate
                .require_edit(ctx, ResourceRef::Document(comment.document_id))
                .await?;
        }

        self.comment_repo.delete(comment_id).await?;

        info!(
            user_id = %ctx.user_id,
            comment_id = %comment_id,
            "Comment deleted"
        );

        Ok(())
    }
}
