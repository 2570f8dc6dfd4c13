// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{CmsError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub diff: DiffConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub local_path: PathBuf,
    /// Content directory, relative to `local_path`.
    pub content_dir: String,
    /// CMS admin configuration, relative to `local_path`.
    pub admin_config: PathBuf,
    pub git_binary: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexConfig {
    pub concurrency: usize,
    pub head_read_limit: usize,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiffConfig {
    pub context_lines: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            local_path: PathBuf::from("./repo"),
            content_dir: "content".to_string(),
            admin_config: PathBuf::from("static/admin/config.yml"),
            git_binary: "git".to_string(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            concurrency: 20,
            head_read_limit: 4096,
            extensions: vec!["md".to_string()],
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self { context_lines: 3 }
    }
}

impl RepositoryConfig {
    pub fn content_root(&self) -> PathBuf {
        self.local_path.join(&self.content_dir)
    }

    /// Content directory as a repository-relative path with forward slashes.
    pub fn content_prefix(&self) -> String {
        self.content_dir
            .replace('\\', "/")
            .trim_matches('/')
            .trim_start_matches("./")
            .to_string()
    }

    /// Maps a content-relative path (`posts/a.md`) to its repository-relative form.
    pub fn repo_relative(&self, content_path: &str) -> String {
        let prefix = self.content_prefix();
        let content_path = content_path.replace('\\', "/");
        let content_path = content_path.trim_start_matches('/');
        if prefix.is_empty() {
            content_path.to_string()
        } else {
            format!("{}/{}", prefix, content_path)
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("HUGO_CMS")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| CmsError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| CmsError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.index.concurrency == 0 {
            return Err(CmsError::Config(
                "index.concurrency must be greater than 0".to_string(),
            ));
        }

        if self.index.head_read_limit == 0 {
            return Err(CmsError::Config(
                "index.head_read_limit must be greater than 0".to_string(),
            ));
        }

        if self.index.extensions.is_empty() {
            return Err(CmsError::Config(
                "index.extensions must name at least one extension".to_string(),
            ));
        }

        if self.repository.content_prefix().split('/').any(|s| s == "..") {
            return Err(CmsError::Config(
                "repository.content_dir must stay inside the repository".to_string(),
            ));
        }

        Ok(())
    }
}
