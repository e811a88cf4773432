//! Placeholder substitution driven by a template values file.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::config::loader::{read_json_file, ConfigError};
use crate::config::tree::{ConfigTree, KEY_DELIMITER};

/// Default placeholder syntax: `${NAME}`.
pub const DEFAULT_PLACEHOLDER_PATTERN: &str = r"\$\{(?P<name>[^{}]+)\}";

/// Compiled placeholder syntax.
///
/// The key is taken from the capture group named `name` if the pattern has
/// one, otherwise from the first capture group.
#[derive(Debug, Clone)]
pub struct PlaceholderPattern {
    regex: Regex,
}

impl PlaceholderPattern {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::Placeholder {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        if regex.captures_len() < 2 {
            return Err(ConfigError::Placeholder {
                pattern: pattern.to_string(),
                reason: "pattern has no capture group for the key".to_string(),
            });
        }
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Replace every placeholder that has a value. Unresolved placeholders
    /// are left untouched, so text without any match comes back borrowed.
    pub fn substitute<'t>(&self, text: &'t str, values: &TemplateValues) -> Cow<'t, str> {
        self.regex.replace_all(text, |caps: &Captures<'_>| {
            let key = caps
                .name("name")
                .or_else(|| caps.get(1))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            match values.get(key) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
    }

    /// Substitute every string leaf of `tree` in place.
    pub fn apply(&self, tree: &mut ConfigTree, values: &TemplateValues) {
        if values.is_empty() {
            return;
        }
        tree.map_strings(&mut |text| match self.substitute(text, values) {
            Cow::Borrowed(_) => None,
            Cow::Owned(replaced) => Some(replaced),
        });
    }
}

impl Default for PlaceholderPattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_PLACEHOLDER_PATTERN).expect("default placeholder pattern is valid"),
        }
    }
}

/// Flat, case-insensitive set of substitution values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateValues {
    values: HashMap<String, String>,
}

impl TemplateValues {
    /// Load values from a JSON file. A missing file yields an empty set.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match read_json_file(path)? {
            Some(tree) => Ok(Self::from_tree(&tree)),
            None => {
                tracing::debug!(path = %path.display(), "No template values file");
                Ok(Self::default())
            }
        }
    }

    /// Flatten a tree into `a:b` keys.
    pub fn from_tree(tree: &ConfigTree) -> Self {
        let mut values = HashMap::new();
        flatten(String::new(), &tree.to_value(), &mut values);
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.values.insert(key.as_ref().to_lowercase(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for TemplateValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::default();
        for (key, value) in iter {
            values.insert(key, value);
        }
        values
    }
}

fn flatten(prefix: String, value: &Value, out: &mut HashMap<String, String>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}{}", prefix, KEY_DELIMITER, key)
        }
    };
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten(join(key), value, out);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten(join(&index.to_string()), value, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix, s.clone());
        }
        Value::Null => {
            out.insert(prefix, String::new());
        }
        other => {
            out.insert(prefix, other.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, &str)]) -> TemplateValues {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_substitutes_known_placeholder() {
        let pattern = PlaceholderPattern::default();
        let v = values(&[("V", "hello")]);
        assert_eq!(pattern.substitute("${V}", &v), "hello");
        assert_eq!(pattern.substitute("say ${V}, ${V}!", &v), "say hello, hello!");
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let pattern = PlaceholderPattern::default();
        let v = values(&[("V", "hello")]);
        let out = pattern.substitute("plain text $ { not } {V}", &v);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, "plain text $ { not } {V}");
    }

    #[test]
    fn test_unresolved_placeholder_passes_through() {
        let pattern = PlaceholderPattern::default();
        assert_eq!(pattern.substitute("${missing}", &TemplateValues::default()), "${missing}");
        let v = values(&[("known", "k")]);
        assert_eq!(pattern.substitute("${known}-${missing}", &v), "k-${missing}");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let pattern = PlaceholderPattern::default();
        let v = values(&[("DbHost", "db.local")]);
        assert_eq!(pattern.substitute("${dbhost}", &v), "db.local");
    }

    #[test]
    fn test_custom_pattern_uses_first_group() {
        let pattern = PlaceholderPattern::new(r"\{\{\s*([A-Za-z0-9_:]+)\s*\}\}").unwrap();
        let v = values(&[("env", "prod")]);
        assert_eq!(pattern.substitute("{{ env }}/${env}", &v), "prod/${env}");
    }

    #[test]
    fn test_pattern_without_group_is_rejected() {
        let err = PlaceholderPattern::new(r"\$\w+").unwrap_err();
        assert!(matches!(err, ConfigError::Placeholder { .. }));
        assert!(PlaceholderPattern::new(r"(unclosed").is_err());
    }

    #[test]
    fn test_values_flatten_nested_objects() {
        let tree = ConfigTree::from_value(json!({
            "Db": {"Host": "h", "Port": 5432, "Replicas": ["r1", "r2"]},
            "Flag": true,
            "Empty": null
        }))
        .unwrap();
        let v = TemplateValues::from_tree(&tree);
        assert_eq!(v.get("db:host"), Some("h"));
        assert_eq!(v.get("db:port"), Some("5432"));
        assert_eq!(v.get("db:replicas:1"), Some("r2"));
        assert_eq!(v.get("flag"), Some("true"));
        assert_eq!(v.get("empty"), Some(""));
    }

    #[test]
    fn test_apply_rewrites_string_leaves_only() {
        let mut tree = ConfigTree::from_value(json!({
            "x": 2,
            "y": "${V}",
            "list": ["${V}", 3],
            "nested": {"z": "pre-${V}-${other}"}
        }))
        .unwrap();
        PlaceholderPattern::default().apply(&mut tree, &values(&[("V", "hello")]));
        assert_eq!(
            tree.to_value(),
            json!({"x": 2, "y": "hello", "list": ["hello", 3], "nested": {"z": "pre-hello-${other}"}})
        );
    }
}
