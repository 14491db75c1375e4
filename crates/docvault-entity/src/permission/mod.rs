//! Permission entities and ability resolution.

pub mod ability;
pub mod model;

pub use ability::Ability;
pub use model::{CreatePermission, Permission, PrincipalRef, ResourceRef, effective_ability};
