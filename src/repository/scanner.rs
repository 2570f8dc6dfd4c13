// file: src/repository/scanner.rs
// description: Content tree walking and bounded head reads
// reference: https://docs.rs/walkdir

use crate::config::IndexConfig;
use crate::error::{CmsError, Result};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub struct FileScanner {
    extensions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the scanned root, forward slashes.
    pub relative_path: String,
}

impl FileScanner {
    pub fn new(config: &IndexConfig) -> Self {
        Self::with_extensions(config.extensions.clone())
    }

    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn scan_directory(&self, root: &Path) -> Result<Vec<ScannedFile>> {
        info!("Scanning directory: {}", root.display());

        if !root.is_dir() {
            return Err(CmsError::FileOperation {
                path: root.to_path_buf(),
                source: std::io::Error::new(ErrorKind::NotFound, "content root is not a directory"),
            });
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(false).into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.has_content_extension(entry.path()) {
                continue;
            }

            let path = entry.path();
            let relative_path = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            files.push(ScannedFile {
                path: path.to_path_buf(),
                relative_path,
            });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        info!("Found {} content files", files.len());
        Ok(files)
    }

    pub fn has_content_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Reads at most `limit` bytes. A UTF-8 sequence cut off by the limit is dropped.
    pub fn read_head(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
        let file = File::open(path)?;
        let mut buf = Vec::with_capacity(limit.min(64 * 1024));
        file.take(limit as u64).read_to_end(&mut buf)?;

        if let Err(e) = std::str::from_utf8(&buf)
            && e.error_len().is_none()
        {
            buf.truncate(e.valid_up_to());
        }
        Ok(buf)
    }
}
