//! Permission repository — grant storage and effective-ability resolution.

use sqlx::PgPool;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::{PermissionId, UserId};
use docvault_entity::permission::ability::Ability;
use docvault_entity::permission::model::{
    CreatePermission, Permission, ResourceRef, effective_ability,
};

/// Repository for permission rows and effective-ability resolution.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a permission by ID.
    pub async fn find_by_id(&self, id: PermissionId) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find permission", e))
    }

    /// All permission rows on a resource, for the management surface.
    pub async fn find_for_resource(&self, resource: ResourceRef) -> AppResult<Vec<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions \
             WHERE file_id IS NOT DISTINCT FROM $1 AND folder_id IS NOT DISTINCT FROM $2 \
             ORDER BY id ASC",
        )
        .bind(resource.file_id())
        .bind(resource.folder_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list permissions", e))
    }

    /// Grant an ability with upsert semantics: an existing row for the
    /// (resource, principal) pair is overwritten in place, never
    /// duplicated. The partial unique indexes are the backstop for races.
    pub async fn grant(&self, data: &CreatePermission) -> AppResult<Permission> {
        let mut tx = super::folder::begin(&self.pool).await?;

        let existing = sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions \
             WHERE file_id IS NOT DISTINCT FROM $1 AND folder_id IS NOT DISTINCT FROM $2 \
               AND user_id IS NOT DISTINCT FROM $3 AND team_id IS NOT DISTINCT FROM $4 \
             FOR UPDATE",
        )
        .bind(data.resource.file_id())
        .bind(data.resource.folder_id())
        .bind(data.principal.user_id())
        .bind(data.principal.team_id())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find grant", e))?;

        let permission = if let Some(existing) = existing {
            sqlx::query_as::<_, Permission>(
                "UPDATE permissions SET ability = $2 WHERE id = $1 RETURNING *",
            )
            .bind(existing.id)
            .bind(data.ability)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update grant", e)
            })?
        } else {
            sqlx::query_as::<_, Permission>(
                "INSERT INTO permissions (file_id, folder_id, user_id, team_id, ability) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING *",
            )
            .bind(data.resource.file_id())
            .bind(data.resource.folder_id())
            .bind(data.principal.user_id())
            .bind(data.principal.team_id())
            .bind(data.ability)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_grant_error)?
        };

        super::folder::commit(tx).await?;
        Ok(permission)
    }

    /// Update a permission's ability in place. The resource owner's row
    /// must stay at EDIT while the resource exists, so lowering it is
    /// rejected.
    pub async fn set_ability(
        &self,
        permission_id: PermissionId,
        ability: Ability,
    ) -> AppResult<Permission> {
        let mut tx = super::folder::begin(&self.pool).await?;

        let permission = sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions WHERE id = $1 FOR UPDATE",
        )
        .bind(permission_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load permission", e))?
        .ok_or_else(|| AppError::not_found(format!("Permission {permission_id} not found")))?;

        if ability < Ability::Edit {
            let owner_id = resource_owner(&mut tx, permission.resource()).await?;
            if owner_id.is_some() && permission.user_id == owner_id {
                return Err(AppError::invalid_operation(
                    "Cannot lower the resource owner's ability",
                ));
            }
        }

        let updated = sqlx::query_as::<_, Permission>(
            "UPDATE permissions SET ability = $2 WHERE id = $1 RETURNING *",
        )
        .bind(permission_id)
        .bind(ability)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update permission", e)
        })?;

        super::folder::commit(tx).await?;
        Ok(updated)
    }

    /// Revoke a permission. The resource owner's own row is protected for
    /// as long as the resource exists.
    pub async fn revoke(&self, permission_id: PermissionId) -> AppResult<()> {
        let mut tx = super::folder::begin(&self.pool).await?;

        let permission = sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions WHERE id = $1 FOR UPDATE",
        )
        .bind(permission_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load permission", e))?
        .ok_or_else(|| AppError::not_found(format!("Permission {permission_id} not found")))?;

        let owner_id = resource_owner(&mut tx, permission.resource()).await?;
        if owner_id.is_some() && permission.user_id == owner_id {
            return Err(AppError::invalid_operation(
                "Cannot revoke the resource owner's permission",
            ));
        }

        sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(permission_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to revoke permission", e)
            })?;

        super::folder::commit(tx).await?;
        Ok(())
    }

    /// The effective ability of a user on a resource: the maximum across
    /// the user's direct grant and every grant to a team the user belongs
    /// to, or `None` when no grant applies.
    pub async fn effective_ability(
        &self,
        resource: ResourceRef,
        user_id: UserId,
    ) -> AppResult<Option<Ability>> {
        let grants = self.applicable_grants(resource, user_id).await?;
        Ok(effective_ability(&grants))
    }

    /// Every grant on a resource that applies to a user, directly or via
    /// team membership.
    pub async fn applicable_grants(
        &self,
        resource: ResourceRef,
        user_id: UserId,
    ) -> AppResult<Vec<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions \
             WHERE file_id IS NOT DISTINCT FROM $1 AND folder_id IS NOT DISTINCT FROM $2 \
               AND (user_id = $3 OR team_id IN \
                    (SELECT team_id FROM team_memberships WHERE user_id = $3))",
        )
        .bind(resource.file_id())
        .bind(resource.folder_id())
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve grants", e))
    }
}

/// The owner of a permission's resource, or `None` if the resource row is
/// gone (an orphaned grant is freely removable).
async fn resource_owner(
    tx: &mut sqlx::Transaction<'static, sqlx::Postgres>,
    resource: Option<ResourceRef>,
) -> AppResult<Option<UserId>> {
    let (sql, id) = match resource {
        Some(ResourceRef::Document(id)) => {
            ("SELECT owner_id FROM documents WHERE id = $1", id.as_i64())
        }
        Some(ResourceRef::Folder(id)) => {
            ("SELECT owner_id FROM folders WHERE id = $1", id.as_i64())
        }
        None => return Ok(None),
    };

    sqlx::query_scalar::<_, UserId>(sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load resource owner", e))
}

/// Map grant insert failures, turning foreign-key violations into
/// not-found (the resource or principal is gone) and unique-index races
/// into conflicts.
fn map_grant_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) => match db_err.constraint() {
            Some(c) if c.starts_with("uniq_permissions_") => {
                AppError::conflict("A grant for this resource and principal already exists")
            }
            Some(c) if c.ends_with("_fkey") => {
                AppError::not_found("Grant references a missing resource or principal")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create grant", e),
        },
        _ => AppError::with_source(ErrorKind::Database, "Failed to create grant", e),
    }
}
