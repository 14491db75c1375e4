//! Folder entities and the materialized-path algebra.

pub mod content;
pub mod model;
pub mod path;

pub use content::{EntryKind, FolderEntry};
pub use model::{CreateFolder, Folder};
pub use path::{PathEntry, PathNode};
