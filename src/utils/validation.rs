// file: src/utils/validation.rs
// description: path validation helpers for content-relative article paths
// reference: input validation patterns

use crate::error::{CmsError, Result};
use std::path::{Component, Path, PathBuf};

pub struct Validator;

impl Validator {
    /// Joins a caller-supplied relative path onto `base`, rejecting anything that
    /// could resolve outside it. Purely lexical so it works for files not yet written.
    pub fn safe_join(base: &Path, relative: &str) -> Result<PathBuf> {
        let cleaned = Self::sanitize_file_path(relative);
        if cleaned.is_empty() {
            return Err(CmsError::InvalidPath("empty path".to_string()));
        }

        let mut joined = base.to_path_buf();
        for component in Path::new(&cleaned).components() {
            match component {
                Component::Normal(part) => joined.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(CmsError::InvalidPath(format!(
                        "path escapes content root: {}",
                        relative
                    )));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(CmsError::InvalidPath(format!(
                        "absolute paths are not allowed: {}",
                        relative
                    )));
                }
            }
        }

        if joined == base {
            return Err(CmsError::InvalidPath(format!(
                "path names the content root itself: {}",
                relative
            )));
        }
        Ok(joined)
    }

    pub fn sanitize_file_path(path: &str) -> String {
        let mut cleaned = path.trim().replace('\\', "/");
        while cleaned.contains("//") {
            cleaned = cleaned.replace("//", "/");
        }
        cleaned
    }
}
