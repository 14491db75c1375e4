//! Team repository — team CRUD and the membership relation consumed by
//! permission resolution.

use sqlx::PgPool;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::{TeamId, UserId};
use docvault_entity::team::model::{CreateTeam, Team};
use docvault_entity::user::model::User;

use super::folder::{begin, commit};

/// Repository for teams and team memberships.
#[derive(Debug, Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    /// Create a new team repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a team by ID.
    pub async fn find_by_id(&self, id: TeamId) -> AppResult<Option<Team>> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find team", e))
    }

    /// Create a team and enroll its owner as the first member, in one
    /// transaction.
    pub async fn create(&self, data: &CreateTeam) -> AppResult<Team> {
        let mut tx = begin(&self.pool).await?;

        let team = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (owner_id, name, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(data.owner_id)
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create team", e))?;

        sqlx::query("INSERT INTO team_memberships (team_id, user_id) VALUES ($1, $2)")
            .bind(team.id)
            .bind(data.owner_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to enroll team owner", e)
            })?;

        commit(tx).await?;
        Ok(team)
    }

    /// Add a member to a team.
    pub async fn add_member(&self, team_id: TeamId, user_id: UserId) -> AppResult<()> {
        sqlx::query("INSERT INTO team_memberships (team_id, user_id) VALUES ($1, $2)")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err)
                    if db_err.constraint() == Some("team_memberships_pkey") =>
                {
                    AppError::conflict(format!("User {user_id} is already in team {team_id}"))
                }
                _ => AppError::with_source(ErrorKind::Database, "Failed to add team member", e),
            })?;
        Ok(())
    }

    /// Remove a member from a team. Returns `true` if a membership existed.
    pub async fn remove_member(&self, team_id: TeamId, user_id: UserId) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM team_memberships WHERE team_id = $1 AND user_id = $2")
                .bind(team_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to remove team member", e)
                })?;
        Ok(result.rows_affected() > 0)
    }

    /// Every team the given user belongs to.
    pub async fn teams_of(&self, user_id: UserId) -> AppResult<Vec<Team>> {
        sqlx::query_as::<_, Team>(
            "SELECT t.* FROM teams t \
             INNER JOIN team_memberships tm ON tm.team_id = t.id \
             WHERE tm.user_id = $1 ORDER BY t.name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list user teams", e))
    }

    /// Every member of the given team.
    pub async fn members_of(&self, team_id: TeamId) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u \
             INNER JOIN team_memberships tm ON tm.user_id = u.id \
             WHERE tm.team_id = $1 ORDER BY u.username ASC",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list team members", e))
    }

    /// Number of members in a team.
    pub async fn member_count(&self, team_id: TeamId) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM team_memberships WHERE team_id = $1")
                .bind(team_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count members", e)
                })?;
        Ok(count as u64)
    }

    /// Delete a team; memberships and team grants go with it.
    pub async fn delete(&self, team_id: TeamId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete team", e))?;
        Ok(result.rows_affected() > 0)
    }
}
