//! Layered configuration tree.
//!
//! A [`ConfigTree`] is a JSON object whose keys keep the spelling they were
//! first written with. Lookups, merges and binding compare keys
//! case-insensitively. Key paths use `:` as separator and address array
//! elements by index (`servers:0:host`).

use serde::de::{self, DeserializeOwned, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};

use crate::config::loader::ConfigError;

/// Separator between the segments of a key path.
pub const KEY_DELIMITER: char = ':';

/// Ordered, layered key/value tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Map<String, Value>,
}

impl ConfigTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a JSON value. Returns `None` unless the value is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match fold_case_duplicates(value) {
            Value::Object(root) => Some(Self { root }),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Merge `layer` over this tree. The layer wins at identical key paths.
    pub fn merge(&mut self, layer: ConfigTree) {
        merge_objects(&mut self.root, layer.root);
    }

    /// Consuming form of [`ConfigTree::merge`].
    pub fn merged(mut self, layer: ConfigTree) -> Self {
        self.merge(layer);
        self
    }

    /// Set the value at a key path, creating intermediate sections.
    ///
    /// Intermediate values that are not objects are replaced.
    pub fn set(&mut self, path: &str, value: Value) {
        let segments: Vec<String> = split_path(path).collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for segment in parents {
            let key = existing_key(current, segment).unwrap_or_else(|| segment.clone());
            let slot = current.entry(key).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => return,
            };
        }
        let key = existing_key(current, last).unwrap_or_else(|| last.clone());
        current.insert(key, fold_case_duplicates(value));
    }

    /// Value at a key path.
    pub fn value(&self, path: &str) -> Option<&Value> {
        let mut segments = split_path(path);
        let first = segments.next()?;
        let mut current = lookup(&self.root, &first)?;
        for segment in segments {
            current = child(current, &segment)?;
        }
        Some(current)
    }

    /// String value at a key path. Non-string scalars are not converted.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.value(path).and_then(Value::as_str)
    }

    /// Section view at a key path. The section may be absent.
    pub fn section(&self, path: &str) -> ConfigSection {
        ConfigSection {
            path: normalized_path(path),
            value: self.value(path).cloned(),
        }
    }

    /// Deserialize the whole tree into `T`. Field names match keys
    /// case-insensitively.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        T::deserialize(Binder(Value::Object(self.root.clone()))).map_err(|source| ConfigError::Bind {
            section: String::new(),
            source,
        })
    }

    /// The tree as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Apply `f` to every string leaf in place.
    pub(crate) fn map_strings(&mut self, f: &mut dyn FnMut(&str) -> Option<String>) {
        for value in self.root.values_mut() {
            map_value_strings(value, f);
        }
    }
}

/// Read-only view of one sub-tree of a [`ConfigTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSection {
    path: String,
    value: Option<Value>,
}

impl ConfigSection {
    /// Normalised key path of this section.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Nested section relative to this one.
    pub fn section(&self, path: &str) -> ConfigSection {
        let mut value = self.value.as_ref();
        for segment in split_path(path) {
            value = value.and_then(|v| child(v, &segment));
        }
        let path = if self.path.is_empty() {
            normalized_path(path)
        } else {
            format!("{}{}{}", self.path, KEY_DELIMITER, normalized_path(path))
        };
        ConfigSection {
            path,
            value: value.cloned(),
        }
    }

    /// String value at a path relative to this section.
    pub fn get_str(&self, path: &str) -> Option<String> {
        self.section(path).value.and_then(|v| v.as_str().map(str::to_string))
    }

    /// Materialize the section into `T`. An absent section binds to `None`.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<Option<T>, ConfigError> {
        match &self.value {
            None => Ok(None),
            Some(value) => T::deserialize(Binder(value.clone()))
                .map(Some)
                .map_err(|source| ConfigError::Bind {
                    section: self.path.clone(),
                    source,
                }),
        }
    }

    /// Materialize the section, falling back to `T::default()` when absent.
    pub fn bind_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, ConfigError> {
        Ok(self.bind()?.unwrap_or_default())
    }
}

fn split_path(path: &str) -> impl Iterator<Item = String> + '_ {
    path.split(KEY_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Lower-cased form of a key path, used to name sections.
fn normalized_path(path: &str) -> String {
    split_path(path)
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(":")
}

fn same_key(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// The stored spelling of `key` in `map`, if any spelling of it is present.
fn existing_key(map: &Map<String, Value>, key: &str) -> Option<String> {
    if map.contains_key(key) {
        return Some(key.to_string());
    }
    map.keys().find(|k| same_key(k, key)).cloned()
}

fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key)
        .or_else(|| map.iter().find(|(k, _)| same_key(k, key)).map(|(_, v)| v))
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => lookup(map, segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Merge keys that differ only by case into the first spelling, recursively.
fn fold_case_duplicates(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut folded = Map::with_capacity(map.len());
            merge_objects(
                &mut folded,
                map.into_iter().map(|(k, v)| (k, fold_case_duplicates(v))).collect(),
            );
            Value::Object(folded)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(fold_case_duplicates).collect()),
        other => other,
    }
}

fn merge_objects(base: &mut Map<String, Value>, layer: Map<String, Value>) {
    for (key, value) in layer {
        let key = existing_key(base, &key).unwrap_or(key);
        match base.get_mut(&key) {
            Some(existing) => merge_values(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => merge_objects(base, layer),
        (Value::Array(base), Value::Array(layer)) => {
            for (index, value) in layer.into_iter().enumerate() {
                match base.get_mut(index) {
                    Some(existing) => merge_values(existing, value),
                    None => base.push(value),
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn map_value_strings(value: &mut Value, f: &mut dyn FnMut(&str) -> Option<String>) {
    match value {
        Value::String(s) => {
            if let Some(replaced) = f(s) {
                *s = replaced;
            }
        }
        Value::Array(items) => {
            for item in items {
                map_value_strings(item, f);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                map_value_strings(item, f);
            }
        }
        _ => {}
    }
}

/// Deserializer over a configuration value that matches struct field names
/// to object keys case-insensitively. Keys of maps bind as written.
struct Binder(Value);

impl Binder {
    fn visit_object<'de, V: Visitor<'de>>(
        map: Map<String, Value>,
        fields: &[&str],
        visitor: V,
    ) -> Result<V::Value, serde_json::Error> {
        let entries = map.into_iter().map(|(key, value)| {
            let key = if fields.contains(&key.as_str()) {
                key
            } else {
                fields
                    .iter()
                    .find(|field| same_key(field, &key))
                    .map(|field| field.to_string())
                    .unwrap_or(key)
            };
            (key, Binder(value))
        });
        let mut access = de::value::MapDeserializer::<_, serde_json::Error>::new(entries);
        let value = visitor.visit_map(&mut access)?;
        access.end()?;
        Ok(value)
    }
}

impl<'de> IntoDeserializer<'de, serde_json::Error> for Binder {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> de::Deserializer<'de> for Binder {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => Self::visit_object(map, &[], visitor),
            Value::Array(items) => {
                let mut access = de::value::SeqDeserializer::<_, serde_json::Error>::new(items.into_iter().map(Binder));
                let value = visitor.visit_seq(&mut access)?;
                access.end()?;
                Ok(value)
            }
            other => de::Deserializer::deserialize_any(other, visitor),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => Self::visit_object(map, fields, visitor),
            other => de::Deserializer::deserialize_struct(other, name, fields, visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        de::Deserializer::deserialize_enum(self.0, name, variants, visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier ignored_any
    }
}
