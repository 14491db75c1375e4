//! # docvault-database
//!
//! PostgreSQL database connection management and concrete repository
//! implementations for all DocVault entities. The three stores live here:
//! the namespace store ([`repositories::FolderRepository`] and
//! [`repositories::DocumentRepository`]), the version store
//! ([`repositories::VersionRepository`]), and the permission store
//! ([`repositories::PermissionRepository`]).
//!
//! Repositories are storage primitives: they enforce transactional
//! invariants (atomic creation units, locked path propagation, version
//! numbering) but never check caller permissions — authorization is a
//! caller-side gate in `docvault-service`.

pub mod connection;
pub mod directory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use directory::PgPrincipalDirectory;
