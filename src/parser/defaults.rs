// file: src/parser/defaults.rs
// description: collection-aware defaulting, list coercion and empty-field pruning
// reference: CMS collection field semantics

use crate::models::value::{CanonicalValue, FrontMatter};
use crate::models::{Collection, WidgetKind};
use crate::parser::canonical::canonicalize;

/// Inserts each field's default when its key is missing. The `body` field maps
/// to the document body, not a front matter key, and is skipped.
pub fn apply_defaults(front_matter: &mut FrontMatter, schema: Option<&Collection>) {
    let Some(schema) = schema else {
        return;
    };

    for field in schema.fields.iter().filter(|f| !f.is_body()) {
        if front_matter.contains_key(&field.name) {
            continue;
        }
        if let Some(default) = &field.default {
            front_matter.insert(field.name.clone(), canonicalize(default));
        }
    }
}

/// Forces every list-widget field into list shape: missing or null becomes
/// empty, a bare scalar is wrapped in a single-element list.
pub fn normalize_list_fields(front_matter: &mut FrontMatter, schema: Option<&Collection>) {
    let Some(schema) = schema else {
        return;
    };

    for field in schema.fields.iter().filter(|f| f.widget == WidgetKind::List) {
        let normalized = match front_matter.get(&field.name) {
            None | Some(CanonicalValue::Null) => CanonicalValue::List(Vec::new()),
            Some(CanonicalValue::List(items)) => {
                CanonicalValue::List(items.iter().map(canonicalize).collect())
            }
            Some(scalar) => CanonicalValue::List(vec![canonicalize(scalar)]),
        };
        front_matter.insert(field.name.clone(), normalized);
    }
}

/// Strips empty strings, empty lists and nulls. Absence propagates upward
/// through maps, but a map that empties out is kept as an empty map.
///
/// Only used for comparison, never for what is written to disk.
pub fn prune_empty(value: &CanonicalValue) -> Option<CanonicalValue> {
    match value {
        CanonicalValue::Null => None,
        CanonicalValue::String(s) if s.is_empty() => None,
        CanonicalValue::List(items) if items.is_empty() => None,
        CanonicalValue::Map(map) => Some(CanonicalValue::Map(prune_empty_map(map))),
        other => Some(other.clone()),
    }
}

pub fn prune_empty_map(map: &FrontMatter) -> FrontMatter {
    map.iter()
        .filter_map(|(k, v)| prune_empty(v).map(|pruned| (k.clone(), pruned)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;
    use pretty_assertions::assert_eq;

    fn posts_schema() -> Collection {
        Collection {
            name: "posts".to_string(),
            folder: "content/posts".to_string(),
            fields: vec![
                Field::new("title", WidgetKind::Other("string".to_string())),
                Field::new("draft", WidgetKind::Boolean).with_default(false),
                Field::new("tags", WidgetKind::List),
                Field::new("published", WidgetKind::DateTime).with_default("2024-01-02"),
                Field::new("body", WidgetKind::Other("markdown".to_string()))
                    .with_default("Default body"),
            ],
        }
    }

    fn map(entries: Vec<(&str, CanonicalValue)>) -> FrontMatter {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_defaults_fill_missing_keys_only() {
        let schema = posts_schema();
        let mut explicit = map(vec![("draft", CanonicalValue::Bool(true))]);
        apply_defaults(&mut explicit, Some(&schema));

        assert_eq!(explicit["draft"], CanonicalValue::Bool(true));
        assert!(matches!(explicit["published"], CanonicalValue::DateTime(_)));
        assert!(!explicit.contains_key("body"));
        assert!(!explicit.contains_key("title"));
    }

    #[test]
    fn test_defaulting_equivalence() {
        let schema = posts_schema();
        let mut omitted = map(vec![("title", "A".into())]);
        let mut explicit = map(vec![
            ("title", "A".into()),
            ("draft", CanonicalValue::Bool(false)),
        ]);

        apply_defaults(&mut omitted, Some(&schema));
        apply_defaults(&mut explicit, Some(&schema));
        assert_eq!(omitted, explicit);
    }

    #[test]
    fn test_no_schema_is_noop() {
        let mut fm = map(vec![("title", "A".into())]);
        let before = fm.clone();
        apply_defaults(&mut fm, None);
        normalize_list_fields(&mut fm, None);
        assert_eq!(fm, before);
    }

    #[test]
    fn test_list_coercion() {
        let schema = posts_schema();

        let mut scalar = map(vec![("tags", "solo".into())]);
        normalize_list_fields(&mut scalar, Some(&schema));
        assert_eq!(scalar["tags"], CanonicalValue::List(vec!["solo".into()]));

        let mut missing = FrontMatter::new();
        normalize_list_fields(&mut missing, Some(&schema));
        assert_eq!(missing["tags"], CanonicalValue::List(vec![]));

        let mut null = map(vec![("tags", CanonicalValue::Null)]);
        normalize_list_fields(&mut null, Some(&schema));
        assert_eq!(null["tags"], CanonicalValue::List(vec![]));

        let mut dated = map(vec![(
            "tags",
            CanonicalValue::List(vec!["2024-01-02".into(), "x".into()]),
        )]);
        normalize_list_fields(&mut dated, Some(&schema));
        let items = dated["tags"].as_list().unwrap();
        assert!(matches!(items[0], CanonicalValue::DateTime(_)));
    }

    #[test]
    fn test_prune_empty() {
        let nested = CanonicalValue::Map(map(vec![
            ("empty", "".into()),
            ("list", CanonicalValue::List(vec![])),
        ]));
        let fm = map(vec![
            ("title", "A".into()),
            ("summary", "".into()),
            ("tags", CanonicalValue::List(vec![])),
            ("draft", CanonicalValue::Bool(false)),
            ("weight", CanonicalValue::Number(0.0)),
            ("params", nested),
            ("gone", CanonicalValue::Null),
        ]);

        let pruned = prune_empty_map(&fm);
        assert_eq!(
            pruned,
            map(vec![
                ("title", "A".into()),
                ("draft", CanonicalValue::Bool(false)),
                ("weight", CanonicalValue::Number(0.0)),
                ("params", CanonicalValue::Map(FrontMatter::new())),
            ])
        );
    }

    #[test]
    fn test_prune_keeps_fully_empty_top_level() {
        let fm = map(vec![("summary", "".into())]);
        let pruned = prune_empty(&CanonicalValue::Map(fm));
        assert_eq!(pruned, Some(CanonicalValue::Map(FrontMatter::new())));
    }
}
