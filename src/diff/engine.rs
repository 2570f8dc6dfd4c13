// file: src/diff/engine.rs
// description: semantic dirty checks and normalized unsaved/committed diffs
// reference: canonical comparison of front matter documents

use crate::diff::render::DiffRenderer;
use crate::error::{CmsError, Result};
use crate::models::value::front_matter_to_json;
use crate::models::{Collection, FrontMatter};
use crate::parser::{
    FrontMatterCodec, apply_defaults, canonicalize_map, normalize_list_fields, prune_empty_map,
};
use crate::repository::source::{BlobSource, SchemaSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub const SAVED_LABEL: &str = "Saved (Normalized)";
pub const EDITOR_LABEL: &str = "Editor";
pub const HEAD_LABEL: &str = "HEAD (Normalized)";
pub const CURRENT_LABEL: &str = "Current (Normalized)";

/// Comparable form of a document.
#[derive(Debug)]
pub enum ComparisonForm {
    /// Canonical JSON of the front matter plus the normalized body. Empty input
    /// yields empty halves.
    Structured { front_matter: Vec<u8>, body: String },
    /// The document could not be parsed; `text` is the normalized raw text.
    Opaque { text: String, error: CmsError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Editor content differs from what is on disk.
    Unsaved,
    /// Editor matches disk, but both differ from the last commit.
    Git,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOutcome {
    pub diff: String,
    #[serde(rename = "type")]
    pub kind: DiffKind,
}

impl DiffOutcome {
    pub fn none() -> Self {
        Self {
            diff: String::new(),
            kind: DiffKind::None,
        }
    }
}

pub struct DiffEngine {
    blobs: Arc<dyn BlobSource>,
    schemas: Arc<dyn SchemaSource>,
    renderer: Arc<dyn DiffRenderer>,
    codec: FrontMatterCodec,
    context_lines: usize,
}

impl DiffEngine {
    pub fn new(
        blobs: Arc<dyn BlobSource>,
        schemas: Arc<dyn SchemaSource>,
        renderer: Arc<dyn DiffRenderer>,
    ) -> Self {
        Self {
            blobs,
            schemas,
            renderer,
            codec: FrontMatterCodec::new(),
            context_lines: 3,
        }
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn resolve_schema(&self, path: &str) -> Option<Collection> {
        self.schemas.resolve_schema(path)
    }

    pub fn canonicalize_for_comparison(
        &self,
        raw: &[u8],
        schema: Option<&Collection>,
    ) -> ComparisonForm {
        let text = normalize_text(raw);
        if text.is_empty() {
            return ComparisonForm::Structured {
                front_matter: Vec::new(),
                body: String::new(),
            };
        }

        let document = match self.codec.parse(text.as_bytes()) {
            Ok(document) => document,
            Err(error) => return ComparisonForm::Opaque { text, error },
        };

        let front_matter = document.front_matter.unwrap_or_default();
        let mut canonical = canonicalize_map(&front_matter);
        apply_defaults(&mut canonical, schema);
        normalize_list_fields(&mut canonical, schema);
        let pruned = prune_empty_map(&canonical);

        let front_matter = match serde_json::to_vec(&front_matter_to_json(&pruned)) {
            Ok(bytes) => bytes,
            Err(e) => {
                return ComparisonForm::Opaque {
                    text,
                    error: CmsError::Serialization(e.to_string()),
                };
            }
        };

        ComparisonForm::Structured {
            front_matter,
            body: normalize_text(document.body.as_bytes()),
        }
    }

    /// True when the working tree copy of `path` (repository-relative) differs
    /// from its last commit in anything other than serialization form.
    pub fn is_semantically_dirty(&self, path: &str) -> Result<bool> {
        let committed = self.blobs.read_committed_version(path)?.unwrap_or_default();
        let current = self.blobs.read_working_tree(path)?.unwrap_or_default();
        let schema = self.schemas.resolve_schema(path);

        Ok(self.differs(&committed, &current, schema.as_ref()))
    }

    fn differs(&self, old: &[u8], new: &[u8], schema: Option<&Collection>) -> bool {
        let old_form = self.canonicalize_for_comparison(old, schema);
        let new_form = self.canonicalize_for_comparison(new, schema);

        match (old_form, new_form) {
            (
                ComparisonForm::Structured {
                    front_matter: old_fm,
                    body: old_body,
                },
                ComparisonForm::Structured {
                    front_matter: new_fm,
                    body: new_body,
                },
            ) => old_fm != new_fm || old_body != new_body,
            (ComparisonForm::Opaque { error, .. }, _) | (_, ComparisonForm::Opaque { error, .. }) => {
                debug!("Falling back to raw comparison: {}", error);
                normalize_text(old) != normalize_text(new)
            }
        }
    }

    /// Display form of a document: parsed, canonicalized, defaulted and written
    /// back out in its own format. Unparseable input is only trimmed.
    pub fn normalize_content(&self, raw: &[u8], schema: Option<&Collection>) -> Vec<u8> {
        let trimmed = String::from_utf8_lossy(raw).trim().to_string();
        if trimmed.is_empty() {
            return Vec::new();
        }

        match self.reserialize(trimmed.as_bytes(), schema) {
            Ok(serialized) => {
                let mut text = String::from_utf8_lossy(&serialized).trim().to_string();
                text.push('\n');
                text.into_bytes()
            }
            Err(e) => {
                debug!("Normalization fell back to raw text: {}", e);
                let mut text = trimmed;
                text.push('\n');
                text.into_bytes()
            }
        }
    }

    fn reserialize(&self, raw: &[u8], schema: Option<&Collection>) -> Result<Vec<u8>> {
        let document = self.codec.parse(raw)?;
        let front_matter: FrontMatter = document.front_matter.unwrap_or_default();
        let mut canonical = canonicalize_map(&front_matter);
        apply_defaults(&mut canonical, schema);
        self.codec.serialize(&canonical, &document.body, document.format)
    }

    /// Compares editor bytes against what is saved, and failing any difference
    /// there, against the last commit of `path`.
    pub fn compute_diff(&self, saved: &[u8], edited: &[u8], path: &str) -> Result<DiffOutcome> {
        let schema = self.schemas.resolve_schema(path);
        let normalized_saved = self.normalize_content(saved, schema.as_ref());
        let normalized_edited = self.normalize_content(edited, schema.as_ref());

        if normalized_saved != normalized_edited {
            let rendered =
                self.renderer
                    .render(&normalized_saved, &normalized_edited, self.context_lines)?;
            return Ok(DiffOutcome {
                diff: rendered.relabel(SAVED_LABEL, EDITOR_LABEL),
                kind: DiffKind::Unsaved,
            });
        }

        let committed = self.blobs.read_committed_version(path)?.unwrap_or_default();
        let normalized_head = self.normalize_content(&committed, schema.as_ref());

        if normalized_head != normalized_edited {
            let rendered =
                self.renderer
                    .render(&normalized_head, &normalized_edited, self.context_lines)?;
            return Ok(DiffOutcome {
                diff: rendered.relabel(HEAD_LABEL, CURRENT_LABEL),
                kind: DiffKind::Git,
            });
        }

        Ok(DiffOutcome::none())
    }
}

/// Lossy UTF-8 decode, CRLF folded to LF, surrounding whitespace trimmed.
pub fn normalize_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .replace("\r\n", "\n")
        .trim()
        .to_string()
}
