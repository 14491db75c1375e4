//! Namespace behavior configuration.

use serde::{Deserialize, Serialize};

/// Configuration for folder/document deletion semantics.
///
/// The legacy system left children, versions, and permissions behind when a
/// folder or document was deleted. Whether that orphaning is desired is an
/// open question, so it is exposed as an explicit policy switch instead of
/// being hard-coded either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// When `true`, deleting a folder removes its entire subtree (child
    /// folders, contained documents, their versions and comments, and every
    /// permission row on the removed resources) in one transaction. When
    /// `false`, only the targeted row is removed.
    #[serde(default)]
    pub cascade_delete: bool,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            cascade_delete: false,
        }
    }
}
