// file: src/parser/mod.rs
// description: front matter parsing and normalization module exports
// reference: internal module structure

pub mod canonical;
pub mod defaults;
pub mod frontmatter;

pub use canonical::{canonicalize, canonicalize_map, format_instant, parse_timestamp};
pub use defaults::{apply_defaults, normalize_list_fields, prune_empty, prune_empty_map};
pub use frontmatter::FrontMatterCodec;
