// file: src/index/mod.rs
// description: article index module exports
// reference: internal module structure

pub mod article_index;
pub mod stats;

pub use article_index::ArticleIndex;
pub use stats::{IndexStats, IndexStatsSnapshot};
