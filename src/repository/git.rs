// file: src/repository/git.rs
// description: git subprocess backend for committed blobs and change status
// reference: https://git-scm.com/docs/git-status#_porcelain_format_version_1

use crate::config::RepositoryConfig;
use crate::error::{CmsError, Result};
use crate::repository::source::{BlobSource, ChangeStatusSource};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;
use tracing::debug;

/// Git backend rooted at `local_path`, which may be a subdirectory of the
/// work tree. Paths in and out are relative to that root.
pub struct GitRepository {
    root: PathBuf,
    git_binary: String,
    // location of `root` below the top level, e.g. "site/"
    prefix: OnceLock<String>,
}

impl GitRepository {
    pub fn new(config: &RepositoryConfig) -> Self {
        Self::open(&config.local_path, &config.git_binary)
    }

    pub fn open(root: impl AsRef<Path>, git_binary: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            git_binary: git_binary.to_string(),
            prefix: OnceLock::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!("git {}", args.join(" "));
        Command::new(&self.git_binary)
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| CmsError::Git(format!("Failed to execute '{}': {}", self.git_binary, e)))
    }

    fn prefix(&self) -> Result<&str> {
        if let Some(prefix) = self.prefix.get() {
            return Ok(prefix.as_str());
        }

        let output = self.run(&["rev-parse", "--show-prefix"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CmsError::Git(format!("git rev-parse failed: {}", stderr.trim())));
        }
        let prefix = String::from_utf8_lossy(&output.stdout)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        Ok(self.prefix.get_or_init(|| prefix).as_str())
    }

    /// Porcelain v1 status with NUL-terminated, unquoted paths. Paths in the
    /// output are relative to the top level regardless of the working directory.
    fn status_porcelain(&self, pathspec: &str) -> Result<Vec<u8>> {
        let output = self.run(&[
            "status",
            "--porcelain",
            "-z",
            "--untracked-files=all",
            "--",
            pathspec,
        ])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CmsError::Git(format!("git status failed: {}", stderr.trim())));
        }

        Ok(output.stdout)
    }
}

impl BlobSource for GitRepository {
    fn read_working_tree(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full_path = self.root.join(path);
        match fs::read(&full_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CmsError::FileOperation {
                path: full_path,
                source,
            }),
        }
    }

    fn read_committed_version(&self, path: &str) -> Result<Option<Vec<u8>>> {
        // "./" resolves against the working directory instead of the top level
        let object = format!("HEAD:./{}", path.replace('\\', "/"));
        let output = self.run(&["show", &object])?;

        if !output.status.success() {
            debug!("No committed version of {}", path);
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }
}

impl ChangeStatusSource for GitRepository {
    fn list_changed_paths(&self, scope: &str) -> Result<HashSet<String>> {
        let output = self.status_porcelain(scope)?;
        let prefix = self.prefix()?;

        Ok(parse_porcelain(&output)
            .into_iter()
            .filter_map(|path| path.strip_prefix(prefix).map(str::to_string))
            .collect())
    }

    fn is_path_changed(&self, path: &str) -> Result<bool> {
        let output = self.status_porcelain(path)?;
        Ok(!output.is_empty())
    }
}

/// Extracts paths from `git status --porcelain -z` output. Renames and copies
/// list the new path first, followed by an entry holding the origin, which is skipped.
pub fn parse_porcelain(output: &[u8]) -> HashSet<String> {
    let mut paths = HashSet::new();
    let mut entries = output.split(|b| *b == 0);

    while let Some(entry) = entries.next() {
        if entry.len() < 4 {
            continue;
        }
        if matches!(entry[0], b'R' | b'C') || matches!(entry[1], b'R' | b'C') {
            entries.next();
        }
        let path = String::from_utf8_lossy(&entry[3..]).into_owned();
        if !path.is_empty() {
            paths.insert(path);
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap()
            .status;
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    fn test_parse_porcelain() {
        let output = " M content/posts/a.md\0?? content/posts/new.md\0R  content/renamed.md\0content/old.md\0A  content/with space.md\0 M content/posts/\u{65e5}\u{8a18}.md\0";
        let paths = parse_porcelain(output.as_bytes());

        assert_eq!(paths.len(), 5);
        assert!(paths.contains("content/posts/a.md"));
        assert!(paths.contains("content/posts/new.md"));
        assert!(paths.contains("content/renamed.md"));
        assert!(!paths.contains("content/old.md"));
        assert!(paths.contains("content/with space.md"));
        assert!(paths.contains("content/posts/\u{65e5}\u{8a18}.md"));
    }

    #[test]
    fn test_parse_porcelain_skips_short_entries() {
        assert!(parse_porcelain(b"M\0??\0\0").is_empty());
    }

    #[test]
    fn test_git_backend_against_real_repository() {
        if !git_available() {
            return;
        }

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        git(root, &["init", "-q"]);
        git(root, &["config", "user.email", "test@example.com"]);
        git(root, &["config", "user.name", "Test"]);

        fs::create_dir_all(root.join("content/posts")).unwrap();
        fs::write(root.join("content/posts/a.md"), "---\ntitle: A\n---\n").unwrap();
        git(root, &["add", "."]);
        git(root, &["-c", "commit.gpgsign=false", "commit", "-q", "-m", "init"]);

        fs::write(root.join("content/posts/a.md"), "---\ntitle: B\n---\n").unwrap();
        fs::write(root.join("content/posts/new.md"), "---\ntitle: N\n---\n").unwrap();

        let repo = GitRepository::open(root, "git");
        assert_eq!(
            repo.read_committed_version("content/posts/a.md").unwrap(),
            Some(b"---\ntitle: A\n---\n".to_vec())
        );
        assert_eq!(repo.read_committed_version("content/posts/new.md").unwrap(), None);
        assert_eq!(repo.read_working_tree("content/missing.md").unwrap(), None);

        let changed = repo.list_changed_paths("content").unwrap();
        assert!(changed.contains("content/posts/a.md"));
        assert!(changed.contains("content/posts/new.md"));

        assert!(repo.is_path_changed("content/posts/a.md").unwrap());
        assert!(!repo.is_path_changed("content/missing.md").unwrap());
    }

    #[test]
    fn test_non_ascii_paths_are_reported_verbatim() {
        if !git_available() {
            return;
        }

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        git(root, &["init", "-q"]);
        git(root, &["config", "user.email", "test@example.com"]);
        git(root, &["config", "user.name", "Test"]);

        let diary = "content/posts/\u{65e5}\u{8a18}.md";
        fs::create_dir_all(root.join("content/posts")).unwrap();
        fs::write(root.join(diary), "---\ntitle: A\n---\n").unwrap();
        git(root, &["add", "."]);
        git(root, &["-c", "commit.gpgsign=false", "commit", "-q", "-m", "init"]);
        fs::write(root.join(diary), "---\ntitle: B\n---\n").unwrap();

        let repo = GitRepository::open(root, "git");
        let changed = repo.list_changed_paths("content").unwrap();
        assert!(changed.contains(diary), "{:?}", changed);
    }

    #[test]
    fn test_site_in_subdirectory_of_work_tree() {
        if !git_available() {
            return;
        }

        let temp = TempDir::new().unwrap();
        let top = temp.path();
        git(top, &["init", "-q"]);
        git(top, &["config", "user.email", "test@example.com"]);
        git(top, &["config", "user.name", "Test"]);

        let site = top.join("site");
        fs::create_dir_all(site.join("content/posts")).unwrap();
        fs::write(site.join("content/posts/a.md"), "---\ntitle: A\n---\n").unwrap();
        git(top, &["add", "."]);
        git(top, &["-c", "commit.gpgsign=false", "commit", "-q", "-m", "init"]);
        fs::write(site.join("content/posts/a.md"), "---\ntitle: B\n---\n").unwrap();

        let repo = GitRepository::open(&site, "git");
        assert_eq!(
            repo.read_committed_version("content/posts/a.md").unwrap(),
            Some(b"---\ntitle: A\n---\n".to_vec())
        );
        let changed = repo.list_changed_paths("content").unwrap();
        assert_eq!(changed.len(), 1);
        assert!(changed.contains("content/posts/a.md"));
    }
}
