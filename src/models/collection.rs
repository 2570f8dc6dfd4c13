// file: src/models/collection.rs
// description: CMS admin configuration collections and field descriptors
// reference: https://docs.rs/yaml-rust

use crate::error::{CmsError, Result};
use crate::models::value::CanonicalValue;
use crate::parser::canonical::from_yaml;
use yaml_rust::{Yaml, YamlLoader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetKind {
    Boolean,
    List,
    DateTime,
    Other(String),
}

impl WidgetKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "boolean" => WidgetKind::Boolean,
            "list" => WidgetKind::List,
            "datetime" => WidgetKind::DateTime,
            other => WidgetKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub widget: WidgetKind,
    pub default: Option<CanonicalValue>,
}

impl Field {
    pub fn new(name: &str, widget: WidgetKind) -> Self {
        Self {
            name: name.to_string(),
            widget,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<CanonicalValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_body(&self) -> bool {
        self.name == "body"
    }
}

/// One content type: a folder in the repository and the fields its files carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub name: String,
    pub folder: String,
    pub fields: Vec<Field>,
}

impl Collection {
    /// Folder with `./`, duplicate and trailing slashes removed.
    pub fn clean_folder(&self) -> String {
        self.folder
            .replace('\\', "/")
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect::<Vec<_>>()
            .join("/")
    }

    /// True when `path` lies inside this collection's folder.
    pub fn contains_path(&self, path: &str) -> bool {
        let folder = self.clean_folder();
        if folder.is_empty() {
            return false;
        }
        let path = path.replace('\\', "/");
        let path = path.trim_start_matches("./");
        path == folder
            || path
                .strip_prefix(folder.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CmsConfig {
    pub collections: Vec<Collection>,
}

impl CmsConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let docs = YamlLoader::load_from_str(content)
            .map_err(|e| CmsError::Config(format!("CMS config YAML parse error: {}", e)))?;

        let Some(root) = docs.first() else {
            return Ok(Self::default());
        };

        let collections = match &root["collections"] {
            Yaml::Array(items) => items.iter().filter_map(parse_collection).collect(),
            Yaml::BadValue | Yaml::Null => Vec::new(),
            _ => {
                return Err(CmsError::Config(
                    "`collections` must be a list".to_string(),
                ));
            }
        };

        Ok(Self { collections })
    }

    /// First collection whose folder contains the repository-relative `path`.
    pub fn collection_for_path(&self, path: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.contains_path(path))
    }
}

fn parse_collection(node: &Yaml) -> Option<Collection> {
    let name = node["name"].as_str()?.to_string();
    let folder = node["folder"].as_str().unwrap_or_default().to_string();

    let fields = match &node["fields"] {
        Yaml::Array(items) => items.iter().filter_map(parse_field).collect(),
        _ => Vec::new(),
    };

    Some(Collection {
        name,
        folder,
        fields,
    })
}

fn parse_field(node: &Yaml) -> Option<Field> {
    let name = node["name"].as_str()?;
    let widget = WidgetKind::from_name(node["widget"].as_str().unwrap_or("string"));

    let default = match &node["default"] {
        Yaml::BadValue | Yaml::Null => None,
        value => Some(from_yaml(value)),
    };

    Some(Field {
        name: name.to_string(),
        widget,
        default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
backend:
  name: git-gateway
collections:
  - name: posts
    folder: content/posts
    fields:
      - { name: title, widget: string }
      - { name: draft, widget: boolean, default: false }
      - { name: tags, widget: list }
      - { name: body, widget: markdown, default: "Write here" }
  - name: pages
    folder: ./content/pages/
    fields:
      - { name: weight, widget: number, default: 10 }
"#;

    #[test]
    fn test_parse_collections() {
        let config = CmsConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.collections.len(), 2);

        let posts = &config.collections[0];
        assert_eq!(posts.name, "posts");
        assert_eq!(posts.fields.len(), 4);
        assert_eq!(posts.fields[1].widget, WidgetKind::Boolean);
        assert_eq!(posts.fields[1].default, Some(CanonicalValue::Bool(false)));
        assert_eq!(posts.fields[2].widget, WidgetKind::List);
        assert!(posts.fields[3].is_body());

        let pages = &config.collections[1];
        assert_eq!(pages.fields[0].default, Some(CanonicalValue::Number(10.0)));
        assert_eq!(
            pages.fields[0].widget,
            WidgetKind::Other("number".to_string())
        );
    }

    #[test]
    fn test_collection_for_path_matches_on_component_boundary() {
        let config = CmsConfig::from_yaml_str(SAMPLE).unwrap();

        let found = config.collection_for_path("content/posts/2024/a.md").unwrap();
        assert_eq!(found.name, "posts");

        let found = config.collection_for_path("content/pages/about.md").unwrap();
        assert_eq!(found.name, "pages");

        assert!(config.collection_for_path("content/postscript/a.md").is_none());
        assert!(config.collection_for_path("static/img.png").is_none());
    }

    #[test]
    fn test_missing_collections_is_empty() {
        let config = CmsConfig::from_yaml_str("backend:\n  name: git\n").unwrap();
        assert!(config.collections.is_empty());
        assert!(CmsConfig::from_yaml_str("collections: 3").is_err());
    }
}
