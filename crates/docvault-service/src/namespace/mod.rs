//! Namespace services.

pub mod service;

pub use service::{CreateDocumentRequest, CreateFolderRequest, NamespaceService};
