//! Permission grant entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{DocumentId, FolderId, PermissionId, TeamId, UserId};

use super::ability::Ability;

/// The object of a permission grant: a document or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceRef {
    /// A document (file) resource.
    Document(DocumentId),
    /// A folder resource.
    Folder(FolderId),
}

impl ResourceRef {
    /// The `file_id` column value for this reference.
    pub fn file_id(&self) -> Option<DocumentId> {
        match self {
            Self::Document(id) => Some(*id),
            Self::Folder(_) => None,
        }
    }

    /// The `folder_id` column value for this reference.
    pub fn folder_id(&self) -> Option<FolderId> {
        match self {
            Self::Document(_) => None,
            Self::Folder(id) => Some(*id),
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document(id) => write!(f, "document {id}"),
            Self::Folder(id) => write!(f, "folder {id}"),
        }
    }
}

/// The subject of a permission grant: a user or a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalRef {
    /// An individual user.
    User(UserId),
    /// Every member of a team.
    Team(TeamId),
}

impl PrincipalRef {
    /// The `user_id` column value for this reference.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Team(_) => None,
        }
    }

    /// The `team_id` column value for this reference.
    pub fn team_id(&self) -> Option<TeamId> {
        match self {
            Self::User(_) => None,
            Self::Team(id) => Some(*id),
        }
    }
}

impl std::fmt::Display for PrincipalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Team(id) => write!(f, "team {id}"),
        }
    }
}

/// A permission row granting an ability to a principal on a resource.
///
/// Exactly one of `file_id`/`folder_id` and exactly one of
/// `user_id`/`team_id` is set; the schema enforces both with CHECK
/// constraints, and at most one row exists per (resource, principal) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    /// Unique permission identifier.
    pub id: PermissionId,
    /// The granted document, if the resource is a document.
    pub file_id: Option<DocumentId>,
    /// The granted folder, if the resource is a folder.
    pub folder_id: Option<FolderId>,
    /// The granted user, if the principal is a user.
    pub user_id: Option<UserId>,
    /// The granted team, if the principal is a team.
    pub team_id: Option<TeamId>,
    /// The granted ability.
    pub ability: Ability,
}

impl Permission {
    /// The resource reference of this row.
    pub fn resource(&self) -> Option<ResourceRef> {
        match (self.file_id, self.folder_id) {
            (Some(id), None) => Some(ResourceRef::Document(id)),
            (None, Some(id)) => Some(ResourceRef::Folder(id)),
            _ => None,
        }
    }

    /// The principal reference of this row.
    pub fn principal(&self) -> Option<PrincipalRef> {
        match (self.user_id, self.team_id) {
            (Some(id), None) => Some(PrincipalRef::User(id)),
            (None, Some(id)) => Some(PrincipalRef::Team(id)),
            _ => None,
        }
    }
}

/// Data required to create a permission grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    /// The resource being granted.
    pub resource: ResourceRef,
    /// The principal receiving the grant.
    pub principal: PrincipalRef,
    /// The granted ability.
    pub ability: Ability,
}

/// The effective ability across a set of applicable grants: the maximum
/// ability among them (Edit > Comment > View), or `None` when no grant
/// applies.
pub fn effective_ability(grants: &[Permission]) -> Option<Ability> {
    grants.iter().map(|p| p.ability).max()
}
