// file: src/service.rs
// description: content service wiring the article store, diff engine and index
// reference: application facade over the core components

use crate::config::Config;
use crate::diff::{DiffEngine, DiffOutcome, DiffRenderer, GitDiffRenderer};
use crate::error::{CmsError, Result};
use crate::index::{ArticleIndex, IndexStatsSnapshot};
use crate::models::{Article, ArticleSummary};
use crate::repository::{
    AdminConfigSchemas, ArticleStore, BlobSource, ChangeStatusSource, GitRepository,
    SchemaSource,
};
use std::fs;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::{info, warn};

/// Entry point for callers. Article paths are content-relative
/// (`posts/hello.md`); the service maps them to repository paths.
pub struct ContentService {
    config: Config,
    store: ArticleStore,
    engine: Arc<DiffEngine>,
    index: ArticleIndex,
    admin_schemas: Option<Arc<AdminConfigSchemas>>,
}

impl ContentService {
    pub fn new(
        config: Config,
        blobs: Arc<dyn BlobSource>,
        status: Arc<dyn ChangeStatusSource>,
        schemas: Arc<dyn SchemaSource>,
        renderer: Arc<dyn DiffRenderer>,
    ) -> Self {
        let engine = Arc::new(
            DiffEngine::new(blobs, schemas, renderer).with_context_lines(config.diff.context_lines),
        );
        let index = ArticleIndex::new(
            engine.clone(),
            status,
            config.repository.clone(),
            config.index.clone(),
        );
        let store = ArticleStore::new(config.repository.content_root());

        Self {
            config,
            store,
            engine,
            index,
            admin_schemas: None,
        }
    }

    /// Service backed by the git working tree and admin configuration named in `config`.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        info!(
            "Opening content repository at {}",
            config.repository.local_path.display()
        );

        let repository = Arc::new(GitRepository::new(&config.repository));
        let schemas = Arc::new(AdminConfigSchemas::load_or_empty(&config.repository));
        let renderer = Arc::new(GitDiffRenderer::new(&config.repository.git_binary));

        let mut service = Self::new(
            config,
            repository.clone(),
            repository,
            schemas.clone(),
            renderer,
        );
        service.admin_schemas = Some(schemas);
        Ok(service)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &DiffEngine {
        &self.engine
    }

    pub fn index_stats(&self) -> IndexStatsSnapshot {
        self.index.stats()
    }

    pub async fn list_articles(&self) -> Result<Arc<Vec<ArticleSummary>>> {
        self.index.list_articles().await
    }

    pub async fn notify_written(&self, path: &str) -> Result<()> {
        self.index.update_one(path).await
    }

    /// For writes whose extent is unknown, such as a pull.
    pub async fn notify_unknown_change(&self) {
        if let Some(schemas) = &self.admin_schemas
            && let Err(e) = schemas.reload()
        {
            warn!("Keeping previous collection schemas: {}", e);
        }
        self.index.invalidate().await;
    }

    pub fn check_dirty(&self, path: &str) -> Result<bool> {
        let repo_path = self.repo_path(path)?;
        self.engine.is_semantically_dirty(&repo_path)
    }

    pub fn diff(&self, saved: &[u8], edited: &[u8], path: &str) -> Result<DiffOutcome> {
        let repo_path = self.repo_path(path)?;
        self.engine.compute_diff(saved, edited, &repo_path)
    }

    /// Diff of an editor payload against the saved file and the last commit.
    pub fn diff_article(&self, article: &Article) -> Result<DiffOutcome> {
        let edited = self.store.encode(article)?;
        let saved = self.saved_bytes(&article.path)?;
        self.diff(&saved, &edited, &article.path)
    }

    pub fn load_article(&self, path: &str) -> Result<Article> {
        self.store.load(path)
    }

    pub async fn save_article(&self, article: &Article) -> Result<()> {
        self.store.save(article)?;
        self.notify_written(&article.path).await
    }

    pub async fn delete_article(&self, path: &str) -> Result<()> {
        self.store.delete(path)?;
        self.notify_written(path).await
    }

    /// On-disk bytes of an article, empty when it has not been saved yet.
    pub fn saved_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.store.resolve(path)?;
        match fs::read(&full_path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(CmsError::FileOperation {
                path: full_path,
                source,
            }),
        }
    }

    fn repo_path(&self, path: &str) -> Result<String> {
        self.store.resolve(path)?;
        Ok(self.config.repository.repo_relative(path.trim_start_matches("./")))
    }
}
