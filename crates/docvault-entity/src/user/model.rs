//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::UserId;

/// A user account. Authentication happens outside this engine; rows exist
/// so ownership, authorship, and grants have something to reference.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Email address, unique per user.
    pub email: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
}
