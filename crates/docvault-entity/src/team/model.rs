//! Team entity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{TeamId, UserId};

/// A team of users; a permission may be granted to a team as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    /// Unique team identifier.
    pub id: TeamId,
    /// The team owner.
    pub owner_id: UserId,
    /// Team name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// A user's membership in a team.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamMembership {
    /// The team.
    pub team_id: TeamId,
    /// The member.
    pub user_id: UserId,
}

/// Data required to create a new team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeam {
    /// The team owner; enrolled as the first member.
    pub owner_id: UserId,
    /// Team name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}
