//! Version services.

pub mod service;

pub use service::VersionService;
