//! Mapper configuration.
//!
//! Configuration is plain data, loadable from TOML:
//!
//! ```toml
//! tokenize = true
//! segment_separator = " "
//! node_kind_annotation_name = "kind"
//! simple_tokenizer_separators = "' ', '.'"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse configuration: {message}")]
    Parse { message: String },

    #[error("invalid separator list {input:?}: {reason}")]
    InvalidSeparators { input: String, reason: String },
}

/// Options recognized by the mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Run the tokenizer. When false every segment becomes a single token.
    pub tokenize: bool,
    /// Inserted between consecutive segment texts in the primary text.
    pub segment_separator: String,
    /// Annotation key for the discourse-unit kind (`segment` / `group`).
    pub node_kind_annotation_name: String,
    /// Annotation key for the optional segment/group type.
    pub node_type_annotation_name: String,
    /// Annotation key for relation names on edges and signals.
    pub relation_name_annotation_name: String,
    /// Split tokens on these characters instead of word boundaries.
    #[serde(deserialize_with = "deserialize_separators")]
    pub simple_tokenizer_separators: Option<Vec<char>>,
    /// Namespace for every annotation the mapper writes.
    pub annotation_namespace: Option<String>,
    /// Tag primary relation edges with `is_signaled` after signals are mapped.
    pub annotate_signaled_edges: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            tokenize: true,
            segment_separator: " ".to_string(),
            node_kind_annotation_name: "kind".to_string(),
            node_type_annotation_name: "type".to_string(),
            relation_name_annotation_name: "relname".to_string(),
            simple_tokenizer_separators: None,
            annotation_namespace: None,
            annotate_signaled_edges: true,
        }
    }
}

impl MapperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Load a configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_tokenize(mut self, tokenize: bool) -> Self {
        self.tokenize = tokenize;
        self
    }

    pub fn with_segment_separator(mut self, separator: impl Into<String>) -> Self {
        self.segment_separator = separator.into();
        self
    }

    pub fn with_simple_tokenizer_separators(mut self, separators: Vec<char>) -> Self {
        self.simple_tokenizer_separators = Some(separators);
        self
    }

    pub fn with_annotation_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.annotation_namespace = Some(namespace.into());
        self
    }

    pub fn with_annotation_names(
        mut self,
        node_kind: impl Into<String>,
        node_type: impl Into<String>,
        relation_name: impl Into<String>,
    ) -> Self {
        self.node_kind_annotation_name = node_kind.into();
        self.node_type_annotation_name = node_type.into();
        self.relation_name_annotation_name = relation_name.into();
        self
    }

    pub fn with_signaled_edge_annotation(mut self, enabled: bool) -> Self {
        self.annotate_signaled_edges = enabled;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeparatorList {
    List(Vec<char>),
    Property(String),
}

fn deserialize_separators<'de, D>(deserializer: D) -> Result<Option<Vec<char>>, D::Error>
where
    D: Deserializer<'de>,
{
    match SeparatorList::deserialize(deserializer)? {
        SeparatorList::List(chars) => Ok(Some(chars)),
        SeparatorList::Property(input) => parse_separator_list(&input)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Parse a list of quoted characters such as `' ', '.', '\''`.
///
/// Items are single-quoted and comma separated. Inside quotes `\'` and `\\`
/// escape a quote and a backslash.
pub fn parse_separator_list(input: &str) -> Result<Vec<char>, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidSeparators {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let mut separators = Vec::new();
    let mut chars = input.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some('\'') => {}
            Some(_) => return Err(invalid("expected an opening quote")),
        }

        let value = match chars.next() {
            Some('\\') => chars.next().ok_or_else(|| invalid("dangling escape"))?,
            Some('\'') => return Err(invalid("empty character literal")),
            Some(c) => c,
            None => return Err(invalid("unterminated character literal")),
        };
        if chars.next() != Some('\'') {
            return Err(invalid("expected a closing quote"));
        }
        separators.push(value);

        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => {}
            Some(_) => return Err(invalid("expected ',' between characters")),
        }
    }

    Ok(separators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = MapperConfig::default();
        assert!(config.tokenize);
        assert_eq!(config.segment_separator, " ");
        assert_eq!(config.node_kind_annotation_name, "kind");
        assert_eq!(config.node_type_annotation_name, "type");
        assert_eq!(config.relation_name_annotation_name, "relname");
        assert_eq!(config.simple_tokenizer_separators, None);
        assert!(config.annotate_signaled_edges);
    }

    #[test]
    fn test_parse_separator_list() {
        assert_eq!(parse_separator_list("' ', '.'").unwrap(), vec![' ', '.']);
        assert_eq!(
            parse_separator_list(r"' ', '\'', ',', '\\'").unwrap(),
            vec![' ', '\'', ',', '\\']
        );
        assert_eq!(parse_separator_list("").unwrap(), Vec::<char>::new());
    }

    #[test]
    fn test_parse_separator_list_errors() {
        assert!(parse_separator_list("' ' '.'").is_err());
        assert!(parse_separator_list("x").is_err());
        assert!(parse_separator_list("''").is_err());
        assert!(parse_separator_list("' ").is_err());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = MapperConfig::from_toml_str(
            r###"
            tokenize = false
            segment_separator = "##"
            "###,
        )
        .unwrap();
        assert!(!config.tokenize);
        assert_eq!(config.segment_separator, "##");
        assert_eq!(config.relation_name_annotation_name, "relname");
    }

    #[test]
    fn test_separators_as_property_string_or_array() {
        let from_property =
            MapperConfig::from_toml_str(r#"simple_tokenizer_separators = "' ', '.'""#).unwrap();
        assert_eq!(from_property.simple_tokenizer_separators, Some(vec![' ', '.']));

        let from_array =
            MapperConfig::from_toml_str(r#"simple_tokenizer_separators = [" ", "."]"#).unwrap();
        assert_eq!(from_array.simple_tokenizer_separators, Some(vec![' ', '.']));

        let bad = MapperConfig::from_toml_str(r#"simple_tokenizer_separators = "x""#);
        assert!(matches!(bad, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = MapperConfig::load(Path::new("/nonexistent/layered-rst.toml")).unwrap();
        assert_eq!(config, MapperConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "relation_name_annotation_name = \"relation\"").unwrap();
        writeln!(file, "annotation_namespace = \"rst\"").unwrap();
        let config = MapperConfig::load(file.path()).unwrap();
        assert_eq!(config.relation_name_annotation_name, "relation");
        assert_eq!(config.annotation_namespace.as_deref(), Some("rst"));
    }

    #[test]
    fn test_builder_methods() {
        let config = MapperConfig::new()
            .with_tokenize(false)
            .with_segment_separator("\n")
            .with_annotation_names("k", "t", "r")
            .with_signaled_edge_annotation(false);
        assert!(!config.tokenize);
        assert_eq!(config.segment_separator, "\n");
        assert_eq!(config.node_kind_annotation_name, "k");
        assert!(!config.annotate_signaled_edges);
    }
}
