//! Shared value types used across DocVault crates.

pub mod id;

pub use id::{CommentId, DocumentId, FolderId, PermissionId, TeamId, UserId, VersionId};
