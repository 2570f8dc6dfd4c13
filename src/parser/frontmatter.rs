// file: src/parser/frontmatter.rs
// description: YAML/TOML/JSON front matter extraction and serialization
// reference: https://docs.rs/yaml-rust

use crate::error::{CmsError, Result};
use crate::models::value::{CanonicalValue, FrontMatter, front_matter_to_json, integral_value};
use crate::models::{Document, FrontMatterFormat};
use crate::parser::canonical::{format_instant, from_json, from_toml, from_yaml, parse_timestamp};
use tracing::debug;
use yaml_rust::yaml::Hash;
use yaml_rust::{Yaml, YamlEmitter, YamlLoader};

pub struct FrontMatterCodec;

impl FrontMatterCodec {
    pub fn new() -> Self {
        Self
    }

    /// Splits `content` into front matter and body.
    ///
    /// Detection order is `---` YAML, `+++` TOML, then a leading `{` JSON
    /// object. A fenced block that fails to parse falls through to the next
    /// rule; if nothing else matches the parse failure is reported.
    pub fn parse(&self, content: &[u8]) -> Result<Document> {
        let text = String::from_utf8_lossy(content);
        let mut malformed: Option<CmsError> = None;

        for format in [FrontMatterFormat::Yaml, FrontMatterFormat::Toml] {
            let Some(delimiter) = format.delimiter() else {
                continue;
            };
            let Some((segment, body)) = split_fenced(&text, delimiter) else {
                continue;
            };

            match parse_segment(format, segment) {
                Ok(front_matter) => {
                    return Ok(Document {
                        path: String::new(),
                        format,
                        front_matter: Some(front_matter),
                        body: body.trim().to_string(),
                    });
                }
                Err(e) => {
                    debug!("Front matter fallthrough: {}", e);
                    malformed.get_or_insert(e);
                }
            }
        }

        if text.trim_start().starts_with('{') {
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(serde_json::Value::Object(map)) => {
                    return Ok(Document {
                        path: String::new(),
                        format: FrontMatterFormat::Json,
                        front_matter: Some(
                            map.iter().map(|(k, v)| (k.clone(), from_json(v))).collect(),
                        ),
                        body: String::new(),
                    });
                }
                Ok(_) => {
                    malformed.get_or_insert(CmsError::MalformedFrontMatter {
                        format: FrontMatterFormat::Json,
                        message: "front matter is not an object".to_string(),
                    });
                }
                Err(e) => {
                    malformed.get_or_insert(CmsError::MalformedFrontMatter {
                        format: FrontMatterFormat::Json,
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(malformed.unwrap_or(CmsError::UnrecognizedFormat))
    }

    /// Writes a document back out. Output is stable but not byte-identical to
    /// whatever was originally parsed: keys come out sorted and integral
    /// numbers as integers. String values are written as given.
    pub fn serialize(
        &self,
        front_matter: &FrontMatter,
        body: &str,
        format: FrontMatterFormat,
    ) -> Result<Vec<u8>> {
        let mut out = String::new();
        match format {
            FrontMatterFormat::Yaml => {
                out.push_str("---\n");
                out.push_str(&emit_yaml(front_matter)?);
                out.push_str("---\n");
            }
            FrontMatterFormat::Toml => {
                out.push_str("+++\n");
                out.push_str(&emit_toml(front_matter)?);
                out.push_str("+++\n");
            }
            FrontMatterFormat::Json => {
                let encoded = serde_json::to_string_pretty(&front_matter_to_json(front_matter))
                    .map_err(|e| CmsError::Serialization(e.to_string()))?;
                out.push_str(&encoded);
                out.push('\n');
                return Ok(out.into_bytes());
            }
            FrontMatterFormat::Unknown => {
                return Err(CmsError::UnsupportedFormat(format.to_string()));
            }
        }

        if !body.is_empty() {
            out.push('\n');
            out.push_str(body);
            out.push('\n');
        }

        Ok(out.into_bytes())
    }
}

impl Default for FrontMatterCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `(segment, body)` when `text` opens with `delimiter` on its own line
/// and a later line closes it.
fn split_fenced<'a>(text: &'a str, delimiter: &str) -> Option<(&'a str, &'a str)> {
    let rest = text.strip_prefix(delimiter)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == delimiter {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn parse_segment(format: FrontMatterFormat, segment: &str) -> Result<FrontMatter> {
    let malformed = |message: String| CmsError::MalformedFrontMatter { format, message };

    match format {
        FrontMatterFormat::Yaml => {
            let docs = YamlLoader::load_from_str(segment).map_err(|e| malformed(e.to_string()))?;
            match docs.first() {
                None | Some(Yaml::Null) => Ok(FrontMatter::new()),
                Some(doc @ Yaml::Hash(_)) => match from_yaml(doc) {
                    CanonicalValue::Map(map) => Ok(map),
                    _ => Err(malformed("front matter is not a mapping".to_string())),
                },
                Some(_) => Err(malformed("front matter is not a mapping".to_string())),
            }
        }
        FrontMatterFormat::Toml => {
            let table: toml::Table =
                toml::from_str(segment).map_err(|e| malformed(e.message().to_string()))?;
            Ok(table.iter().map(|(k, v)| (k.clone(), from_toml(v))).collect())
        }
        FrontMatterFormat::Json | FrontMatterFormat::Unknown => {
            Err(CmsError::UnsupportedFormat(format.to_string()))
        }
    }
}

fn to_yaml(value: &CanonicalValue) -> Yaml {
    match value {
        CanonicalValue::Null => Yaml::Null,
        CanonicalValue::Bool(b) => Yaml::Boolean(*b),
        CanonicalValue::Number(n) => match integral_value(*n) {
            Some(i) => Yaml::Integer(i),
            None if n.is_nan() => Yaml::Real(".nan".to_string()),
            None if n.is_infinite() && *n > 0.0 => Yaml::Real(".inf".to_string()),
            None if n.is_infinite() => Yaml::Real("-.inf".to_string()),
            None => Yaml::Real(n.to_string()),
        },
        // quoted, or timestamp-resolving readers load it as a date
        CanonicalValue::String(s) if s.trim() == s && parse_timestamp(s).is_some() => {
            Yaml::Real(format!("\"{}\"", s))
        }
        CanonicalValue::String(s) => Yaml::String(s.clone()),
        // Real is emitted verbatim, so the instant lands as a plain scalar
        CanonicalValue::DateTime(dt) => Yaml::Real(format_instant(dt)),
        CanonicalValue::List(items) => Yaml::Array(items.iter().map(to_yaml).collect()),
        CanonicalValue::Map(map) => Yaml::Hash(yaml_hash(map)),
    }
}

fn yaml_hash(map: &FrontMatter) -> Hash {
    let mut hash = Hash::new();
    for (key, value) in map {
        hash.insert(Yaml::String(key.clone()), to_yaml(value));
    }
    hash
}

fn emit_yaml(map: &FrontMatter) -> Result<String> {
    if map.is_empty() {
        return Ok(String::new());
    }

    let doc = Yaml::Hash(yaml_hash(map));
    let mut emitted = String::new();
    {
        let mut emitter = YamlEmitter::new(&mut emitted);
        emitter
            .dump(&doc)
            .map_err(|e| CmsError::Serialization(format!("YAML emit error: {:?}", e)))?;
    }

    let mut out = emitted
        .strip_prefix("---")
        .unwrap_or(&emitted)
        .trim_start_matches('\n')
        .to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

fn to_toml(value: &CanonicalValue) -> Option<toml::Value> {
    match value {
        CanonicalValue::Null => None,
        CanonicalValue::Bool(b) => Some(toml::Value::Boolean(*b)),
        CanonicalValue::Number(n) => Some(match integral_value(*n) {
            Some(i) => toml::Value::Integer(i),
            None => toml::Value::Float(*n),
        }),
        CanonicalValue::String(s) => Some(toml::Value::String(s.clone())),
        CanonicalValue::DateTime(dt) => {
            let text = format_instant(dt);
            Some(match text.parse::<toml::value::Datetime>() {
                Ok(datetime) => toml::Value::Datetime(datetime),
                Err(_) => toml::Value::String(text),
            })
        }
        CanonicalValue::List(items) => {
            Some(toml::Value::Array(items.iter().filter_map(to_toml).collect()))
        }
        CanonicalValue::Map(map) => Some(toml::Value::Table(toml_table(map))),
    }
}

// TOML has no null, so null entries are left out.
fn toml_table(map: &FrontMatter) -> toml::Table {
    map.iter()
        .filter_map(|(k, v)| to_toml(v).map(|value| (k.clone(), value)))
        .collect()
}

fn emit_toml(map: &FrontMatter) -> Result<String> {
    let mut out = toml::to_string(&toml_table(map))
        .map_err(|e| CmsError::Serialization(format!("TOML emit error: {}", e)))?;
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::canonical::canonicalize_map;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn sample_front_matter() -> FrontMatter {
        let mut nested = FrontMatter::new();
        nested.insert("weight".to_string(), CanonicalValue::Number(3.0));
        nested.insert("ratio".to_string(), CanonicalValue::Number(0.5));

        let mut fm = FrontMatter::new();
        fm.insert("title".to_string(), "Hello: World".into());
        fm.insert("draft".to_string(), CanonicalValue::Bool(false));
        fm.insert(
            "date".to_string(),
            CanonicalValue::DateTime(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
        );
        fm.insert(
            "tags".to_string(),
            CanonicalValue::List(vec!["rust".into(), "123".into()]),
        );
        fm.insert("params".to_string(), CanonicalValue::Map(nested));
        fm
    }

    #[test]
    fn test_parse_yaml() {
        let codec = FrontMatterCodec::new();
        let doc = codec
            .parse(b"---\ntitle: Test\ndate: 2024-01-01\n---\n\n# Content\n")
            .unwrap();

        assert_eq!(doc.format, FrontMatterFormat::Yaml);
        assert_eq!(doc.title(), Some("Test"));
        assert_eq!(doc.body, "# Content");
    }

    #[test]
    fn test_parse_yaml_with_crlf_and_inner_dashes() {
        let codec = FrontMatterCodec::new();
        let doc = codec
            .parse(b"---\r\ntitle: a---b\r\n---\r\nBody with --- inside\r\n")
            .unwrap();

        assert_eq!(doc.title(), Some("a---b"));
        assert_eq!(doc.body, "Body with --- inside");
    }

    #[test]
    fn test_parse_toml() {
        let codec = FrontMatterCodec::new();
        let doc = codec
            .parse(b"+++\ntitle = \"Toml\"\nweight = 2\n+++\nBody")
            .unwrap();

        assert_eq!(doc.format, FrontMatterFormat::Toml);
        assert_eq!(doc.title(), Some("Toml"));
        let fm = doc.front_matter.unwrap();
        assert_eq!(fm["weight"], CanonicalValue::Number(2.0));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_parse_json() {
        let codec = FrontMatterCodec::new();
        let doc = codec.parse(b"  {\"title\": \"Json\", \"n\": 1}\n").unwrap();

        assert_eq!(doc.format, FrontMatterFormat::Json);
        assert_eq!(doc.title(), Some("Json"));
        assert!(doc.body.is_empty());
    }

    #[test]
    fn test_delimiters_without_body() {
        let codec = FrontMatterCodec::new();
        let doc = codec.parse(b"---\ntitle: A\n---\n").unwrap();
        assert_eq!(doc.format, FrontMatterFormat::Yaml);
        assert!(doc.body.is_empty());

        let empty = codec.parse(b"---\n---\n").unwrap();
        assert_eq!(empty.front_matter, Some(FrontMatter::new()));
    }

    #[test]
    fn test_unrecognized_and_malformed() {
        let codec = FrontMatterCodec::new();
        assert!(matches!(
            codec.parse(b"# Just markdown"),
            Err(CmsError::UnrecognizedFormat)
        ));
        assert!(matches!(
            codec.parse(b"---\ntitle: [unclosed\n---\nbody"),
            Err(CmsError::MalformedFrontMatter {
                format: FrontMatterFormat::Yaml,
                ..
            })
        ));
        assert!(matches!(
            codec.parse(b"---\n- a\n- b\n---\n"),
            Err(CmsError::MalformedFrontMatter { .. })
        ));
        // opening fence with no closing fence
        assert!(matches!(
            codec.parse(b"---\ntitle: A\n"),
            Err(CmsError::UnrecognizedFormat)
        ));
    }

    #[test]
    fn test_serialize_yaml_layout() {
        let codec = FrontMatterCodec::new();
        let mut fm = FrontMatter::new();
        fm.insert("title".to_string(), "A".into());
        fm.insert("tags".to_string(), CanonicalValue::List(vec!["x".into()]));

        let bytes = codec.serialize(&fm, "Body", FrontMatterFormat::Yaml).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "---\ntags:\n  - x\ntitle: A\n---\n\nBody\n");
    }

    #[test]
    fn test_serialize_toml_and_json_layout() {
        let codec = FrontMatterCodec::new();
        let mut fm = FrontMatter::new();
        fm.insert("title".to_string(), "A".into());
        fm.insert("weight".to_string(), CanonicalValue::Number(2.0));

        let toml_text =
            String::from_utf8(codec.serialize(&fm, "", FrontMatterFormat::Toml).unwrap()).unwrap();
        assert_eq!(toml_text, "+++\ntitle = \"A\"\nweight = 2\n+++\n");

        let json_text =
            String::from_utf8(codec.serialize(&fm, "ignored", FrontMatterFormat::Json).unwrap())
                .unwrap();
        assert_eq!(json_text, "{\n  \"title\": \"A\",\n  \"weight\": 2\n}\n");
    }

    #[test]
    fn test_serialize_unknown_format_fails() {
        let codec = FrontMatterCodec::new();
        let result = codec.serialize(&FrontMatter::new(), "", FrontMatterFormat::Unknown);
        assert!(matches!(result, Err(CmsError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_round_trip_all_formats() {
        let codec = FrontMatterCodec::new();
        let fm = sample_front_matter();

        for (format, body) in [
            (FrontMatterFormat::Yaml, "# Heading\n\nText"),
            (FrontMatterFormat::Toml, "Body"),
            (FrontMatterFormat::Json, ""),
        ] {
            let bytes = codec.serialize(&fm, body, format).unwrap();
            let doc = codec.parse(&bytes).unwrap();
            assert_eq!(doc.format, format);
            let parsed = canonicalize_map(doc.front_matter.as_ref().unwrap());
            assert_eq!(parsed, fm, "format {}", format);
            assert_eq!(doc.body, body);
        }
    }

    #[test]
    fn test_date_like_strings_survive_serialization() {
        let codec = FrontMatterCodec::new();
        let doc = codec
            .parse(b"---\nslug: 2024-01-02\ntitle: '2024-01-02'\n---\n\nBody\n")
            .unwrap();
        let fm = doc.front_matter.unwrap();

        let text =
            String::from_utf8(codec.serialize(&fm, &doc.body, FrontMatterFormat::Yaml).unwrap())
                .unwrap();
        assert_eq!(text, "---\nslug: \"2024-01-02\"\ntitle: \"2024-01-02\"\n---\n\nBody\n");

        let reparsed = codec.parse(text.as_bytes()).unwrap();
        assert_eq!(reparsed.title(), Some("2024-01-02"));
        assert_eq!(reparsed.front_matter.unwrap(), fm);

        let toml_text =
            String::from_utf8(codec.serialize(&fm, "", FrontMatterFormat::Toml).unwrap()).unwrap();
        assert!(toml_text.contains("slug = \"2024-01-02\""));
    }

    #[test]
    fn test_toml_omits_null() {
        let codec = FrontMatterCodec::new();
        let mut fm = FrontMatter::new();
        fm.insert("title".to_string(), "A".into());
        fm.insert("gone".to_string(), CanonicalValue::Null);

        let doc = codec
            .parse(&codec.serialize(&fm, "", FrontMatterFormat::Toml).unwrap())
            .unwrap();
        assert!(!doc.front_matter.unwrap().contains_key("gone"));
    }
}
