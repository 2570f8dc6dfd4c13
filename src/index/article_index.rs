// file: src/index/article_index.rs
// description: cached article listing built over a bounded worker pool
// reference: https://docs.rs/futures/latest/futures/stream/trait.StreamExt.html#method.buffer_unordered

use crate::config::{IndexConfig, RepositoryConfig};
use crate::diff::DiffEngine;
use crate::error::{CmsError, Result};
use crate::index::stats::{IndexStats, IndexStatsSnapshot};
use crate::models::{ArticleSummary, Document};
use crate::repository::scanner::{FileScanner, ScannedFile};
use crate::repository::source::ChangeStatusSource;
use crate::utils::telemetry::OperationTimer;
use crate::utils::validation::Validator;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

enum IndexState {
    Empty,
    Populated(Arc<Vec<ArticleSummary>>),
}

/// Per-file result of a summary job. `degraded` is set when the title or
/// dirty flag had to fall back.
struct FileSummary {
    summary: ArticleSummary,
    degraded: bool,
}

/// Title and dirty flag for every content file, computed on first request and
/// kept until invalidated.
///
/// A single exclusive lock guards the cache. It is held for the whole rebuild,
/// so concurrent callers that arrive while the index is empty wait for the one
/// rebuild instead of starting their own.
pub struct ArticleIndex {
    state: Mutex<IndexState>,
    engine: Arc<DiffEngine>,
    status: Arc<dyn ChangeStatusSource>,
    repository: RepositoryConfig,
    config: IndexConfig,
    stats: IndexStats,
}

impl ArticleIndex {
    pub fn new(
        engine: Arc<DiffEngine>,
        status: Arc<dyn ChangeStatusSource>,
        repository: RepositoryConfig,
        config: IndexConfig,
    ) -> Self {
        Self {
            state: Mutex::new(IndexState::Empty),
            engine,
            status,
            repository,
            config,
            stats: IndexStats::new(),
        }
    }

    pub fn stats(&self) -> IndexStatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn is_populated(&self) -> bool {
        matches!(*self.state.lock().await, IndexState::Populated(_))
    }

    pub async fn list_articles(&self) -> Result<Arc<Vec<ArticleSummary>>> {
        let mut state = self.state.lock().await;
        if let IndexState::Populated(list) = &*state {
            return Ok(list.clone());
        }

        let list = Arc::new(self.rebuild().await?);
        *state = IndexState::Populated(list.clone());
        Ok(list)
    }

    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        *state = IndexState::Empty;
        self.stats.inc_invalidations();
        debug!("Article index invalidated");
    }

    /// Refreshes the entry for one content-relative path. Does nothing while
    /// the index is empty; the next listing picks the file up anyway.
    pub async fn update_one(&self, path: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let IndexState::Populated(current) = &*state else {
            debug!("Article index empty, skipping update for {}", path);
            return Ok(());
        };

        let timer = OperationTimer::new("article index update");
        let content_root = self.repository.content_root();
        let full_path = Validator::safe_join(&content_root, path)?;
        if !FileScanner::new(&self.config).has_content_extension(&full_path) {
            debug!("Ignoring non-content path {}", path);
            return Ok(());
        }
        let content_path = Validator::sanitize_file_path(path)
            .trim_start_matches("./")
            .to_string();
        let repo_path = self.repository.repo_relative(&content_path);

        let engine = self.engine.clone();
        let status = self.status.clone();
        let head_limit = self.config.head_read_limit;
        let job_path = content_path.clone();

        let refreshed = tokio::task::spawn_blocking(move || {
            if !full_path.is_file() {
                return None;
            }
            let changed = match status.is_path_changed(&repo_path) {
                Ok(changed) => changed,
                Err(e) => {
                    warn!("Status check failed for {}: {}", repo_path, e);
                    false
                }
            };
            Some(summarize_file(
                &engine, &job_path, &full_path, &repo_path, changed, head_limit,
            ))
        })
        .await
        .map_err(|e| CmsError::Task(e.to_string()))?;

        let mut list = (**current).clone();
        let position = list.iter().position(|s| s.path == content_path);

        match (refreshed, position) {
            (Some(file), Some(index)) => {
                self.record_fallbacks(&file);
                list[index] = file.summary;
            }
            (Some(file), None) => {
                self.record_fallbacks(&file);
                list.push(file.summary);
                list.sort_by(|a, b| a.path.cmp(&b.path));
            }
            (None, Some(index)) => {
                list.remove(index);
            }
            (None, None) => {}
        }

        *state = IndexState::Populated(Arc::new(list));
        self.stats.inc_updates();

        let elapsed = timer.finish();
        info!("Updated article index entry {} in {:?}", content_path, elapsed);
        Ok(())
    }

    async fn rebuild(&self) -> Result<Vec<ArticleSummary>> {
        let timer = OperationTimer::new("article index rebuild");

        let content_root = self.repository.content_root();
        let scanner = FileScanner::new(&self.config);
        let files = tokio::task::spawn_blocking({
            let content_root = content_root.clone();
            move || scanner.scan_directory(&content_root)
        })
        .await
        .map_err(|e| CmsError::Task(e.to_string()))??;

        let changed = Arc::new(self.changed_paths().await);
        let width = self.config.concurrency.max(1);
        let head_limit = self.config.head_read_limit;
        let total = files.len();

        let jobs = files.into_iter().enumerate().map(|(slot, file)| {
            let engine = self.engine.clone();
            let changed = changed.clone();
            let repo_path = self.repository.repo_relative(&file.relative_path);

            async move {
                let fallback_path = file.relative_path.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    let is_changed = changed.contains(&repo_path);
                    summarize_scanned(&engine, &file, &repo_path, is_changed, head_limit)
                })
                .await;

                match joined {
                    Ok(file_summary) => (slot, file_summary),
                    Err(e) => {
                        warn!("Summary task for {} failed: {}", fallback_path, e);
                        (
                            slot,
                            FileSummary {
                                summary: ArticleSummary::fallback(fallback_path),
                                degraded: true,
                            },
                        )
                    }
                }
            }
        });

        let results: Vec<(usize, FileSummary)> = stream::iter(jobs)
            .buffer_unordered(width)
            .collect()
            .await;

        let mut slots: Vec<Option<ArticleSummary>> = vec![None; total];
        let mut degraded = 0;
        for (slot, file) in results {
            if file.degraded {
                degraded += 1;
            }
            slots[slot] = Some(file.summary);
        }

        let mut list: Vec<ArticleSummary> = slots.into_iter().flatten().collect();
        list.sort_by(|a, b| a.path.cmp(&b.path));

        self.stats.inc_rebuilds();
        self.stats.add_fallbacks(degraded);

        timer.warn_if_slow(Duration::from_secs(10));
        let elapsed = timer.finish_with_count(list.len());
        info!(
            "Rebuilt article index: {} articles, {} dirty, {} degraded in {:?}",
            list.len(),
            list.iter().filter(|s| s.is_dirty).count(),
            degraded,
            elapsed
        );

        Ok(list)
    }

    /// One status query for the whole content directory. A failed query is
    /// treated as "nothing changed" so the listing still renders.
    async fn changed_paths(&self) -> HashSet<String> {
        let status = self.status.clone();
        let scope = self.repository.content_prefix();

        let queried = tokio::task::spawn_blocking(move || status.list_changed_paths(&scope)).await;
        match queried {
            Ok(Ok(paths)) => {
                debug!("{} changed paths under content", paths.len());
                paths
            }
            Ok(Err(e)) => {
                warn!("Change status query failed: {}", e);
                HashSet::new()
            }
            Err(e) => {
                warn!("Change status task failed: {}", e);
                HashSet::new()
            }
        }
    }

    fn record_fallbacks(&self, file: &FileSummary) {
        if file.degraded {
            self.stats.add_fallbacks(1);
        }
    }
}

fn summarize_scanned(
    engine: &DiffEngine,
    file: &ScannedFile,
    repo_path: &str,
    is_changed: bool,
    head_limit: usize,
) -> FileSummary {
    summarize_file(
        engine,
        &file.relative_path,
        &file.path,
        repo_path,
        is_changed,
        head_limit,
    )
}

/// Title from the file head, dirty flag from the semantic check. Only paths
/// the status source reported as changed get the semantic check.
fn summarize_file(
    engine: &DiffEngine,
    content_path: &str,
    full_path: &Path,
    repo_path: &str,
    is_changed: bool,
    head_limit: usize,
) -> FileSummary {
    let mut degraded = false;

    let title = match FileScanner::read_head(full_path, head_limit) {
        Ok(head) => Document::from_bytes(content_path, &head)
            .title()
            .map(str::to_string),
        Err(e) => {
            debug!("Could not read {}: {}", full_path.display(), e);
            degraded = true;
            None
        }
    };

    let is_dirty = is_changed
        && match engine.is_semantically_dirty(repo_path) {
            Ok(dirty) => dirty,
            Err(e) => {
                warn!("Dirty check failed for {}: {}", repo_path, e);
                degraded = true;
                false
            }
        };

    FileSummary {
        summary: ArticleSummary {
            path: content_path.to_string(),
            title: title.unwrap_or_else(|| content_path.to_string()),
            is_dirty,
        },
        degraded,
    }
}
