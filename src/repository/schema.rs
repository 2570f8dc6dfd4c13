// file: src/repository/schema.rs
// description: collection schema lookup backed by the CMS admin configuration file
// reference: configurable path-based classification

use crate::config::RepositoryConfig;
use crate::error::{CmsError, Result};
use crate::models::{CmsConfig, Collection};
use crate::repository::source::SchemaSource;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};

/// Schema source that reads `static/admin/config.yml` (or the configured path)
/// and can be reloaded after the working tree changes underneath it.
pub struct AdminConfigSchemas {
    config_path: PathBuf,
    config: RwLock<CmsConfig>,
}

impl AdminConfigSchemas {
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref().to_path_buf();
        let config = read_cms_config(&config_path)?;
        Ok(Self {
            config_path,
            config: RwLock::new(config),
        })
    }

    /// Loads the admin configuration, or an empty one if the file does not exist.
    pub fn load_or_empty(repository: &RepositoryConfig) -> Self {
        let config_path = repository.local_path.join(&repository.admin_config);
        let config = match read_cms_config(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("No collection schemas loaded: {}", e);
                CmsConfig::default()
            }
        };
        Self {
            config_path,
            config: RwLock::new(config),
        }
    }

    pub fn reload(&self) -> Result<()> {
        let fresh = read_cms_config(&self.config_path)?;
        info!(
            "Reloaded {} collections from {}",
            fresh.collections.len(),
            self.config_path.display()
        );
        match self.config.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        Ok(())
    }
}

impl SchemaSource for AdminConfigSchemas {
    fn resolve_schema(&self, path: &str) -> Option<Collection> {
        match self.config.read() {
            Ok(guard) => guard.resolve_schema(path),
            Err(poisoned) => poisoned.into_inner().resolve_schema(path),
        }
    }
}

fn read_cms_config(path: &Path) -> Result<CmsConfig> {
    let content = fs::read_to_string(path).map_err(|source| CmsError::FileOperation {
        path: path.to_path_buf(),
        source,
    })?;
    CmsConfig::from_yaml_str(&content)
}
