//! The caller-side authorization gate.

use std::sync::Arc;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_database::repositories::permission::PermissionRepository;
use docvault_entity::permission::{Ability, ResourceRef};

use crate::context::RequestContext;

/// Resolves effective abilities and rejects under-privileged callers.
///
/// Authorization is a gate in front of the storage primitives, not part of
/// them: services consult the gate first and touch the repositories only
/// on success.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    /// Permission repository.
    permission_repo: Arc<PermissionRepository>,
}

impl PermissionGate {
    /// Creates a new permission gate.
    pub fn new(permission_repo: Arc<PermissionRepository>) -> Self {
        Self { permission_repo }
    }

    /// The acting principal's effective ability on a resource.
    pub async fn effective(
        &self,
        ctx: &RequestContext,
        resource: ResourceRef,
    ) -> AppResult<Option<Ability>> {
        self.permission_repo
            .effective_ability(resource, ctx.user_id)
            .await
    }

    /// Require the acting principal to hold at least `required` on the
    /// resource.
    pub async fn require(
        &self,
        ctx: &RequestContext,
        resource: ResourceRef,
        required: Ability,
    ) -> AppResult<()> {
        let effective = self.effective(ctx, resource).await?;
        if effective.is_some_and(|ability| ability >= required) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "User {} requires {required} on {resource}",
                ctx.user_id
            )))
        }
    }

    /// Require the EDIT ability; every mutating operation goes through
    /// this gate.
    pub async fn require_edit(&self, ctx: &RequestContext, resource: ResourceRef) -> AppResult<()> {
        self.require(ctx, resource, Ability::Edit).await
    }
}
