//! Principal directory seam.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{TeamId, UserId};

/// Lookup interface for principals, consumed (not owned) by permission
/// resolution.
///
/// Implemented by whatever identity layer backs the deployment; the
/// reference implementation lives over the user/team repositories.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync + 'static {
    /// Resolve a user by email address, e.g. for the sharing surface.
    async fn resolve_user_by_email(&self, email: &str) -> AppResult<Option<UserId>>;

    /// Every team the given user is a member of.
    async fn teams_of(&self, user_id: UserId) -> AppResult<Vec<TeamId>>;
}
