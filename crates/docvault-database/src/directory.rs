//! PostgreSQL-backed principal directory.

use async_trait::async_trait;
use sqlx::PgPool;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::PrincipalDirectory;
use docvault_core::types::{TeamId, UserId};

/// [`PrincipalDirectory`] implementation over the users and
/// team_memberships tables.
#[derive(Debug, Clone)]
pub struct PgPrincipalDirectory {
    pool: PgPool,
}

impl PgPrincipalDirectory {
    /// Create a new directory over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalDirectory for PgPrincipalDirectory {
    async fn resolve_user_by_email(&self, email: &str) -> AppResult<Option<UserId>> {
        sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to resolve user by email", e)
            })
    }

    async fn teams_of(&self, user_id: UserId) -> AppResult<Vec<TeamId>> {
        sqlx::query_scalar::<_, TeamId>(
            "SELECT team_id FROM team_memberships WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list user teams", e))
    }
}
