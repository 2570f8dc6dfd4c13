// file: src/models/document.rs
// description: parsed content document and its front matter format tag
// reference: internal data structures

use crate::models::value::FrontMatter;
use crate::parser::frontmatter::FrontMatterCodec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrontMatterFormat {
    Yaml,
    Toml,
    Json,
    #[default]
    Unknown,
}

impl FrontMatterFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrontMatterFormat::Yaml => "yaml",
            FrontMatterFormat::Toml => "toml",
            FrontMatterFormat::Json => "json",
            FrontMatterFormat::Unknown => "unknown",
        }
    }

    /// Delimiter line for formats that fence their front matter.
    pub fn delimiter(&self) -> Option<&'static str> {
        match self {
            FrontMatterFormat::Yaml => Some("---"),
            FrontMatterFormat::Toml => Some("+++"),
            FrontMatterFormat::Json | FrontMatterFormat::Unknown => None,
        }
    }
}

impl fmt::Display for FrontMatterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrontMatterFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => FrontMatterFormat::Yaml,
            "toml" => FrontMatterFormat::Toml,
            "json" => FrontMatterFormat::Json,
            _ => FrontMatterFormat::Unknown,
        })
    }
}

/// A content file split into front matter and body.
///
/// `front_matter` is `None` only for opaque documents, i.e. content that did
/// not match any known front matter layout and is carried as raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub path: String,
    pub format: FrontMatterFormat,
    pub front_matter: Option<FrontMatter>,
    pub body: String,
}

impl Document {
    pub fn opaque(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: FrontMatterFormat::Unknown,
            front_matter: None,
            body: text.into(),
        }
    }

    /// Parses `bytes`, degrading to an opaque document when no format matches.
    pub fn from_bytes(path: impl Into<String>, bytes: &[u8]) -> Self {
        let path = path.into();
        match FrontMatterCodec::new().parse(bytes) {
            Ok(mut document) => {
                document.path = path;
                document
            }
            Err(_) => Self::opaque(path, String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.front_matter.is_none()
    }

    /// Top-level `title` field, when it is a string.
    pub fn title(&self) -> Option<&str> {
        self.front_matter
            .as_ref()
            .and_then(|fm| fm.get("title"))
            .and_then(|value| value.as_str())
    }
}
