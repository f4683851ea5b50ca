//! Front-matter splitting and the open metadata mapping

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;

/// Delimiter line that opens and closes a front-matter block
const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("invalid front-matter format: missing closing '---'")]
    Unterminated,

    #[error("front matter is not a key/value mapping")]
    NotAMapping,

    #[error("failed to parse YAML front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Arbitrary front-matter fields, in declaration order.
///
/// Values are YAML values (strings, numbers, booleans, lists, nested
/// mappings). Accessors never fail on a type mismatch; they return an
/// empty default instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(IndexMap<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// String field, or `None` when absent or not a string
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// String field, or `""` when absent or not a string
    pub fn get_str(&self, key: &str) -> &str {
        self.str(key).unwrap_or("")
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// String entries of a list field. A single string counts as a
    /// one-element list; non-string entries are dropped.
    pub fn get_str_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Split a file into its front-matter mapping and markdown body.
///
/// Input that does not start with `---` has no front matter and is
/// returned unchanged. Otherwise the text up to the next `---` is
/// decoded as YAML and the remainder (minus the newline that ends the
/// closing delimiter line) is the body.
pub fn split(content: &str) -> Result<(Option<Metadata>, &str), FrontMatterError> {
    let Some(rest) = content.strip_prefix(DELIMITER) else {
        return Ok((None, content));
    };

    let (block, body) = rest
        .split_once(DELIMITER)
        .ok_or(FrontMatterError::Unterminated)?;

    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);

    if block.trim().is_empty() {
        return Ok((Some(Metadata::new()), body));
    }

    let value: Value = serde_yaml::from_str(block)?;
    let metadata = match value {
        Value::Mapping(_) => serde_yaml::from_value::<Metadata>(value)?,
        Value::Null => Metadata::new(),
        _ => return Err(FrontMatterError::NotAMapping),
    };

    Ok((Some(metadata), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_front_matter() {
        let (meta, body) = split("---\ntitle: X\n---\nbody").unwrap();
        let meta = meta.unwrap();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.get_str("title"), "X");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_no_front_matter_returns_input_unchanged() {
        let input = "# Heading\n\nSome text ---\n";
        let (meta, body) = split(input).unwrap();
        assert!(meta.is_none());
        assert_eq!(body, input);
    }

    #[test]
    fn test_unterminated_front_matter() {
        let err = split("---\ntitle: X\nbody").unwrap_err();
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn test_malformed_yaml_propagates() {
        let err = split("---\ntitle: [unclosed\n---\nbody").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }

    #[test]
    fn test_scalar_front_matter_is_rejected() {
        let err = split("---\njust a sentence\n---\nbody").unwrap_err();
        assert!(matches!(err, FrontMatterError::NotAMapping));
    }

    #[test]
    fn test_empty_block() {
        let (meta, body) = split("---\n---\nhello").unwrap();
        assert!(meta.unwrap().is_empty());
        assert_eq!(body, "hello");
    }

    #[test]
    fn test_typed_accessors() {
        let content = r#"---
title: Hello World
date: 2024-01-15
draft: true
words: 42
categories:
  - rust
  - 7
  - web
tags: notes
---
"#;
        let (meta, _) = split(content).unwrap();
        let meta = meta.unwrap();
        assert_eq!(meta.get_str("date"), "2024-01-15");
        assert_eq!(meta.get_str("words"), "");
        assert_eq!(meta.get_str("missing"), "");
        assert!(meta.get_bool("draft"));
        assert_eq!(meta.get_str_list("categories"), vec!["rust", "web"]);
        assert_eq!(meta.get_str_list("tags"), vec!["notes"]);
        assert!(meta.get_str_list("title").len() == 1);
    }

    #[test]
    fn test_key_order_preserved() {
        let (meta, _) = split("---\nzeta: 1\nalpha: 2\n---\n").unwrap();
        let keys: Vec<_> = meta.unwrap().iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
