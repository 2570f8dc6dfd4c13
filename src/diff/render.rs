// file: src/diff/render.rs
// description: unified diff rendering through `git diff --no-index`
// reference: https://git-scm.com/docs/git-diff#_description

use crate::error::{CmsError, Result};
use std::fs;
use std::process::Command;
use tracing::debug;

/// Output of a renderer. The label sources are whatever identifiers the
/// renderer put in the diff header for the old and new side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedDiff {
    pub text: String,
    pub old_label_source: String,
    pub new_label_source: String,
}

impl RenderedDiff {
    /// Rewrites the header lines (everything before the first hunk) so both
    /// sides are named by `old_label` and `new_label`. Hunk content is untouched.
    pub fn relabel(&self, old_label: &str, new_label: &str) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut in_header = true;

        for line in self.text.split_inclusive('\n') {
            if line.starts_with("@@") {
                in_header = false;
            }
            if in_header {
                let mut relabeled = line.to_string();
                if !self.old_label_source.is_empty() {
                    relabeled = relabeled.replace(&self.old_label_source, old_label);
                }
                if !self.new_label_source.is_empty() {
                    relabeled = relabeled.replace(&self.new_label_source, new_label);
                }
                out.push_str(&relabeled);
            } else {
                out.push_str(line);
            }
        }

        out
    }
}

/// Produces a unified line diff between two buffers. Empty `text` means the
/// buffers have no line differences.
pub trait DiffRenderer: Send + Sync {
    fn render(&self, old: &[u8], new: &[u8], context_lines: usize) -> Result<RenderedDiff>;
}

const OLD_NAME: &str = "a.cms-old";
const NEW_NAME: &str = "b.cms-new";

pub struct GitDiffRenderer {
    git_binary: String,
}

impl GitDiffRenderer {
    pub fn new(git_binary: &str) -> Self {
        Self {
            git_binary: git_binary.to_string(),
        }
    }
}

impl Default for GitDiffRenderer {
    fn default() -> Self {
        Self::new("git")
    }
}

impl DiffRenderer for GitDiffRenderer {
    fn render(&self, old: &[u8], new: &[u8], context_lines: usize) -> Result<RenderedDiff> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(OLD_NAME), old)?;
        fs::write(dir.path().join(NEW_NAME), new)?;

        let context = format!("-U{}", context_lines);
        let output = Command::new(&self.git_binary)
            .args([
                "diff",
                "--no-index",
                "--no-prefix",
                "--no-color",
                "--no-ext-diff",
                context.as_str(),
                "--",
                OLD_NAME,
                NEW_NAME,
            ])
            .current_dir(dir.path())
            .output()
            .map_err(|e| CmsError::Git(format!("Failed to execute '{}': {}", self.git_binary, e)))?;

        let text = match output.status.code() {
            Some(0) => String::new(),
            Some(1) => String::from_utf8_lossy(&output.stdout).into_owned(),
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(CmsError::Git(format!("git diff failed: {}", stderr.trim())));
            }
        };

        debug!("Rendered diff of {} bytes", text.len());
        Ok(RenderedDiff {
            text,
            old_label_source: OLD_NAME.to_string(),
            new_label_source: NEW_NAME.to_string(),
        })
    }
}
