// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod article;
pub mod collection;
pub mod document;
pub mod value;

pub use article::{Article, ArticleSummary};
pub use collection::{CmsConfig, Collection, Field, WidgetKind};
pub use document::{Document, FrontMatterFormat};
pub use value::{CanonicalValue, FrontMatter, front_matter_to_json};
