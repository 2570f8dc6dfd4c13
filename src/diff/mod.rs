// file: src/diff/mod.rs
// description: diff engine module exports
// reference: internal module structure

pub mod engine;
pub mod render;

pub use engine::{ComparisonForm, DiffEngine, DiffKind, DiffOutcome, normalize_text};
pub use render::{DiffRenderer, GitDiffRenderer, RenderedDiff};
