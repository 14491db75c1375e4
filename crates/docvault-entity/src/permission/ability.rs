//! The ordered ability enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use docvault_core::AppError;

/// What a principal may do with a resource.
///
/// Totally ordered by privilege: Edit > Comment > View. Stored as a
/// `SMALLINT` (1/2/3); any other stored value fails to decode rather than
/// producing an invalid ability.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    /// Read-only access.
    View = 1,
    /// May read and add comments.
    Comment = 2,
    /// May read, comment, and modify.
    Edit = 3,
}

impl Ability {
    /// Return the stored SMALLINT encoding.
    pub fn as_i16(&self) -> i16 {
        *self as i16
    }

    /// Return the ability as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Comment => "comment",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for Ability {
    type Error = AppError;

    fn try_from(raw: i16) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Self::View),
            2 => Ok(Self::Comment),
            3 => Ok(Self::Edit),
            _ => Err(AppError::validation(format!(
                "Invalid ability value: {raw}"
            ))),
        }
    }
}

impl FromStr for Ability {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(Self::View),
            "comment" => Ok(Self::Comment),
            "edit" => Ok(Self::Edit),
            _ => Err(AppError::validation(format!("Invalid ability: '{s}'"))),
        }
    }
}
