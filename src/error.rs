// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use crate::models::FrontMatterFormat;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CmsError>;

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("Unrecognized front matter format")]
    UnrecognizedFormat,

    #[error("Malformed {format} front matter: {message}")]
    MalformedFrontMatter {
        format: FrontMatterFormat,
        message: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Git error: {0}")]
    Git(String),

    #[error("Worker task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CmsError {
    /// Parse failures that callers recover from by treating the content as opaque text.
    pub fn is_recoverable_parse(&self) -> bool {
        matches!(
            self,
            CmsError::UnrecognizedFormat | CmsError::MalformedFrontMatter { .. }
        )
    }
}
