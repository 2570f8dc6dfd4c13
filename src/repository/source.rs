// file: src/repository/source.rs
// description: seams for the blob, change-status and schema collaborators
// reference: internal module structure

use crate::error::Result;
use crate::models::{CmsConfig, Collection};
use std::collections::HashSet;

/// Reads document bytes from the working tree and from the last commit.
/// Paths are repository-relative with forward slashes.
pub trait BlobSource: Send + Sync {
    /// `Ok(None)` when the file does not exist on disk.
    fn read_working_tree(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// `Ok(None)` when the path is not part of the last commit (new or untracked).
    fn read_committed_version(&self, path: &str) -> Result<Option<Vec<u8>>>;
}

/// Reports which paths textually differ between the working tree and the last commit.
pub trait ChangeStatusSource: Send + Sync {
    /// All changed paths under `scope` (a repository-relative directory).
    fn list_changed_paths(&self, scope: &str) -> Result<HashSet<String>>;

    /// Single-path status query.
    fn is_path_changed(&self, path: &str) -> Result<bool>;
}

/// Resolves the collection schema governing a repository-relative path.
pub trait SchemaSource: Send + Sync {
    fn resolve_schema(&self, path: &str) -> Option<Collection>;
}

impl SchemaSource for CmsConfig {
    fn resolve_schema(&self, path: &str) -> Option<Collection> {
        self.collection_for_path(path).cloned()
    }
}

/// Schema source for repositories without a CMS admin configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchemas;

impl SchemaSource for NoSchemas {
    fn resolve_schema(&self, _path: &str) -> Option<Collection> {
        None
    }
}
