// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod diff;
pub mod error;
pub mod index;
pub mod models;
pub mod parser;
pub mod repository;
pub mod service;
pub mod utils;

pub use config::{Config, DiffConfig, IndexConfig, RepositoryConfig};
pub use diff::{ComparisonForm, DiffEngine, DiffKind, DiffOutcome, DiffRenderer, GitDiffRenderer};
pub use error::{CmsError, Result};
pub use index::{ArticleIndex, IndexStatsSnapshot};
pub use models::{
    Article, ArticleSummary, CanonicalValue, CmsConfig, Collection, Document, Field, FrontMatter,
    FrontMatterFormat, WidgetKind,
};
pub use parser::FrontMatterCodec;
pub use repository::{
    AdminConfigSchemas, ArticleStore, BlobSource, ChangeStatusSource, FileScanner, GitRepository,
    NoSchemas, SchemaSource,
};
pub use service::ContentService;
pub use utils::{OperationTimer, Validator};

/// In-memory collaborators shared by unit tests across modules.
#[cfg(test)]
pub(crate) mod test_support {
    use crate::diff::{DiffRenderer, RenderedDiff};
    use crate::error::{CmsError, Result};
    use crate::repository::source::{BlobSource, ChangeStatusSource};
    use std::collections::{HashMap, HashSet};
    use std::fs;
    use std::io::ErrorKind;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use walkdir::WalkDir;

    /// Working tree on disk in a temp dir, "last commit" held in memory.
    /// Status reports every path whose bytes differ between the two.
    pub(crate) struct FakeRepo {
        dir: TempDir,
        head: Mutex<HashMap<String, Vec<u8>>>,
        failing: Mutex<HashSet<String>>,
        status_calls: AtomicUsize,
        single_status_paths: Mutex<Vec<String>>,
        committed_reads: Mutex<Vec<String>>,
    }

    impl FakeRepo {
        pub(crate) fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                head: Mutex::new(HashMap::new()),
                failing: Mutex::new(HashSet::new()),
                status_calls: AtomicUsize::new(0),
                single_status_paths: Mutex::new(Vec::new()),
                committed_reads: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn root(&self) -> &Path {
            self.dir.path()
        }

        pub(crate) fn write(&self, path: &str, content: &str) {
            let full = self.dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }

        pub(crate) fn remove(&self, path: &str) {
            fs::remove_file(self.dir.path().join(path)).unwrap();
        }

        pub(crate) fn commit(&self, path: &str, content: &str) {
            self.head
                .lock()
                .unwrap()
                .insert(path.to_string(), content.as_bytes().to_vec());
        }

        pub(crate) fn commit_and_write(&self, path: &str, content: &str) {
            self.commit(path, content);
            self.write(path, content);
        }

        pub(crate) fn fail_committed_reads_for(&self, path: &str) {
            self.failing.lock().unwrap().insert(path.to_string());
        }

        pub(crate) fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn single_status_paths(&self) -> Vec<String> {
            self.single_status_paths.lock().unwrap().clone()
        }

        pub(crate) fn committed_reads(&self) -> Vec<String> {
            self.committed_reads.lock().unwrap().clone()
        }

        pub(crate) fn clear_committed_reads(&self) {
            self.committed_reads.lock().unwrap().clear();
        }

        fn working_bytes(&self, path: &str) -> Option<Vec<u8>> {
            fs::read(self.dir.path().join(path)).ok()
        }

        fn differs(&self, path: &str) -> bool {
            let head = self.head.lock().unwrap().get(path).cloned();
            head != self.working_bytes(path)
        }
    }

    impl BlobSource for FakeRepo {
        fn read_working_tree(&self, path: &str) -> Result<Option<Vec<u8>>> {
            match fs::read(self.dir.path().join(path)) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(CmsError::Io(e)),
            }
        }

        fn read_committed_version(&self, path: &str) -> Result<Option<Vec<u8>>> {
            self.committed_reads.lock().unwrap().push(path.to_string());
            if self.failing.lock().unwrap().contains(path) {
                return Err(CmsError::Git(format!("cannot read HEAD:{}", path)));
            }
            Ok(self.head.lock().unwrap().get(path).cloned())
        }
    }

    impl ChangeStatusSource for FakeRepo {
        fn list_changed_paths(&self, scope: &str) -> Result<HashSet<String>> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);

            let mut candidates: HashSet<String> = WalkDir::new(self.dir.path().join(scope))
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter_map(|e| {
                    e.path()
                        .strip_prefix(self.dir.path())
                        .ok()
                        .map(|p| p.to_string_lossy().replace('\\', "/"))
                })
                .collect();
            let prefix = format!("{}/", scope);
            candidates.extend(
                self.head
                    .lock()
                    .unwrap()
                    .keys()
                    .filter(|k| k.starts_with(&prefix))
                    .cloned(),
            );

            Ok(candidates.into_iter().filter(|p| self.differs(p)).collect())
        }

        fn is_path_changed(&self, path: &str) -> Result<bool> {
            self.single_status_paths.lock().unwrap().push(path.to_string());
            Ok(self.differs(path))
        }
    }

    /// Line-per-line diff: every old line removed, every new line added.
    pub(crate) struct FakeRenderer;

    impl DiffRenderer for FakeRenderer {
        fn render(&self, old: &[u8], new: &[u8], _context_lines: usize) -> Result<RenderedDiff> {
            if old == new {
                return Ok(RenderedDiff {
                    old_label_source: "old".to_string(),
                    new_label_source: "new".to_string(),
                    ..RenderedDiff::default()
                });
            }

            let mut text = String::from("--- old\n+++ new\n@@ -1 +1 @@\n");
            for line in String::from_utf8_lossy(old).lines() {
                text.push_str(&format!("-{}\n", line));
            }
            for line in String::from_utf8_lossy(new).lines() {
                text.push_str(&format!("+{}\n", line));
            }

            Ok(RenderedDiff {
                text,
                old_label_source: "old".to_string(),
                new_label_source: "new".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        let _codec = FrontMatterCodec::new();
        assert_eq!(FrontMatterFormat::default(), FrontMatterFormat::Unknown);
    }
}
