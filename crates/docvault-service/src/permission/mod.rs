//! Permission services.

pub mod service;

pub use service::PermissionService;
