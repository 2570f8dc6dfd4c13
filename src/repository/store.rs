// file: src/repository/store.rs
// description: article load, save and delete against the content directory
// reference: page bundle cleanup on delete

use crate::error::{CmsError, Result};
use crate::models::{Article, Document};
use crate::parser::FrontMatterCodec;
use crate::utils::validation::Validator;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads and writes articles addressed by content-relative paths.
pub struct ArticleStore {
    content_root: PathBuf,
    codec: FrontMatterCodec,
}

impl ArticleStore {
    pub fn new(content_root: impl AsRef<Path>) -> Self {
        Self {
            content_root: content_root.as_ref().to_path_buf(),
            codec: FrontMatterCodec::new(),
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        Validator::safe_join(&self.content_root, path)
    }

    pub fn load(&self, path: &str) -> Result<Article> {
        let full_path = self.resolve(path)?;
        let bytes = fs::read(&full_path).map_err(|source| CmsError::FileOperation {
            path: full_path.clone(),
            source,
        })?;

        let document = Document::from_bytes(path, &bytes);
        if document.is_opaque() {
            debug!("Loaded {} as raw content", path);
        }
        Ok(Article::from(document))
    }

    /// Encoded file contents for an editor payload: serialized front matter
    /// when present, otherwise the raw content verbatim.
    pub fn encode(&self, article: &Article) -> Result<Vec<u8>> {
        match &article.front_matter {
            Some(front_matter) => self.codec.serialize(front_matter, &article.body, article.format),
            None => Ok(article.content.clone().into_bytes()),
        }
    }

    pub fn save(&self, article: &Article) -> Result<()> {
        let full_path = self.resolve(&article.path)?;
        let bytes = self.encode(article)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|source| CmsError::FileOperation {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&full_path, bytes).map_err(|source| CmsError::FileOperation {
            path: full_path.clone(),
            source,
        })?;

        info!("Saved article {}", article.path);
        Ok(())
    }

    /// Removes the file, then its bundle directory if that is now empty and
    /// nested at least two levels below the content root.
    pub fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.resolve(path)?;
        fs::remove_file(&full_path).map_err(|source| CmsError::FileOperation {
            path: full_path.clone(),
            source,
        })?;
        info!("Deleted article {}", path);

        let Some(parent) = full_path.parent() else {
            return Ok(());
        };
        let depth = parent
            .strip_prefix(&self.content_root)
            .map(|rel| rel.components().count())
            .unwrap_or(0);

        if depth >= 2 && is_empty_dir(parent) {
            match fs::remove_dir(parent) {
                Ok(()) => debug!("Removed empty bundle directory {}", parent.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(CmsError::FileOperation {
                        path: parent.to_path_buf(),
                        source,
                    });
                }
            }
        }

        Ok(())
    }
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
