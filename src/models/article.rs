// file: src/models/article.rs
// description: article listing summaries and editor payloads
// reference: internal data structures

use crate::models::document::{Document, FrontMatterFormat};
use crate::models::value::FrontMatter;
use serde::{Deserialize, Serialize};

/// One row of the article listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub path: String,
    pub title: String,
    pub is_dirty: bool,
}

impl ArticleSummary {
    /// Summary used when a file could not be read or parsed.
    pub fn fallback(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            title: path.clone(),
            path,
            is_dirty: false,
        }
    }
}

/// Article as exchanged with the editor.
///
/// Either `front_matter` is set (structured edit) or `content` carries the
/// whole raw file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(
        default,
        rename = "frontmatter",
        skip_serializing_if = "Option::is_none"
    )]
    pub front_matter: Option<FrontMatter>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(default)]
    pub format: FrontMatterFormat,
}

impl Article {
    pub fn raw(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn structured(
        path: impl Into<String>,
        front_matter: FrontMatter,
        body: impl Into<String>,
        format: FrontMatterFormat,
    ) -> Self {
        Self {
            path: path.into(),
            front_matter: Some(front_matter),
            body: body.into(),
            format,
            ..Self::default()
        }
    }
}

impl From<Document> for Article {
    fn from(document: Document) -> Self {
        match document.front_matter {
            Some(front_matter) => {
                Article::structured(document.path, front_matter, document.body, document.format)
            }
            None => Article::raw(document.path, document.body),
        }
    }
}
