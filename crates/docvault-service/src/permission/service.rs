//! Permission management — grant, revoke, and resolve abilities.

use std::sync::Arc;

use tracing::info;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::PrincipalDirectory;
use docvault_core::types::{PermissionId, UserId};
use docvault_database::repositories::permission::PermissionRepository;
use docvault_entity::permission::{Ability, CreatePermission, Permission, PrincipalRef, ResourceRef};

use crate::context::RequestContext;
use crate::gate::PermissionGate;

/// Manages permission grants on resources.
#[derive(Clone)]
pub struct PermissionService {
    /// Permission repository.
    permission_repo: Arc<PermissionRepository>,
    /// Principal lookup seam.
    directory: Arc<dyn PrincipalDirectory>,
    /// Authorization gate.
    gate: PermissionGate,
}

impl PermissionService {
    /// Creates a new permission service.
    pub fn new(
        permission_repo: Arc<PermissionRepository>,
        directory: Arc<dyn PrincipalDirectory>,
        gate: PermissionGate,
    ) -> Self {
        Self {
            permission_repo,
            directory,
            gate,
        }
    }

    /// Grants an ability to a principal on a resource. An existing grant
    /// for the same pair is overwritten, never duplicated.
    pub async fn grant(
        &self,
        ctx: &RequestContext,
        resource: ResourceRef,
        principal: PrincipalRef,
        ability: Ability,
    ) -> AppResult<Permission> {
        self.gate.require_edit(ctx, resource).await?;

        let permission = self
            .permission_repo
            .grant(&CreatePermission {
                resource,
                principal,
                ability,
            })
            .await?;

        info!(
            user_id = %ctx.user_id,
            permission_id = %permission.id,
            resource = %resource,
            principal = %principal,
            ability = %ability,
            "Permission granted"
        );

        Ok(permission)
    }

    /// Grants an ability to the user registered under the given email.
    pub async fn grant_by_email(
        &self,
        ctx: &RequestContext,
        resource: ResourceRef,
        email: &str,
        ability: Ability,
    ) -> AppResult<Permission> {
        let user_id = self
            .directory
            .resolve_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No user with email '{email}'")))?;

        self.grant(ctx, resource, PrincipalRef::User(user_id), ability)
            .await
    }

    /// Revokes a grant. The resource owner's own grant cannot be revoked.
    pub async fn revoke(&self, ctx: &RequestContext, permission_id: PermissionId) -> AppResult<()> {
        let permission = self
            .permission_repo
            .find_by_id(permission_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Permission {permission_id} not found")))?;

        if let Some(resource) = permission.resource() {
            self.gate.require_edit(ctx, resource).await?;
        }

        self.permission_repo.revoke(permission_id).await?;

        info!(
            user_id = %ctx.user_id,
            permission_id = %permission_id,
            "Permission revoked"
        );

        Ok(())
    }

    /// Changes the ability of an existing grant in place.
    pub async fn set_ability(
        &self,
        ctx: &RequestContext,
        permission_id: PermissionId,
        ability: Ability,
    ) -> AppResult<Permission> {
        let permission = self
            .permission_repo
            .find_by_id(permission_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Permission {permission_id} not found")))?;

        if let Some(resource) = permission.resource() {
            self.gate.require_edit(ctx, resource).await?;
        }

        let updated = self.permission_repo.set_ability(permission_id, ability).await?;

        info!(
            user_id = %ctx.user_id,
            permission_id = %permission_id,
            ability = %ability,
            "Permission ability changed"
        );

        Ok(updated)
    }

    /// The effective ability of a user on a resource: the maximum across
    /// direct and team grants, or `None` when no grant applies.
    pub async fn effective_ability(
        &self,
        resource: ResourceRef,
        user_id: UserId,
    ) -> AppResult<Option<Ability>> {
        self.permission_repo.effective_ability(resource, user_id).await
    }

    /// All grants on a resource, for the management surface.
    pub async fn permissions_for(
        &self,
        ctx: &RequestContext,
        resource: ResourceRef,
    ) -> AppResult<Vec<Permission>> {
        self.gate.require_edit(ctx, resource).await?;
        self.permission_repo.find_for_resource(resource).await
    }
}
