use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// A named field instance on a [`ContentNode`](crate::ContentNode).
///
/// The alias must exist in the owning content type's schema. Values are
/// either invariant or stored per culture, depending on whether the
/// property type varies by culture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub alias: String,
    #[serde(default)]
    values: PropertyValues,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct PropertyValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invariant: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    cultures: BTreeMap<String, Value>,
}

impl Property {
    /// Creates an empty property.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            values: PropertyValues::default(),
        }
    }

    /// Creates a property holding an invariant value.
    pub fn with_value(alias: impl Into<String>, value: Value) -> Self {
        let mut p = Self::new(alias);
        p.set_value(value, None);
        p
    }

    /// Reads the value for `culture`, or the invariant value for `None`.
    pub fn get_value(&self, culture: Option<&str>) -> Option<&Value> {
        match culture {
            Some(c) => self.values.cultures.get(c),
            None => self.values.invariant.as_ref(),
        }
    }

    /// Writes the value for `culture`, or the invariant value for `None`.
    /// Writing `null` clears the slot.
    pub fn set_value(&mut self, value: Value, culture: Option<&str>) {
        match (culture, value) {
            (Some(c), Value::Null) => {
                self.values.cultures.remove(c);
            }
            (Some(c), v) => {
                self.values.cultures.insert(c.to_string(), v);
            }
            (None, Value::Null) => self.values.invariant = None,
            (None, v) => self.values.invariant = Some(v),
        }
    }

    /// Cultures that currently hold a value.
    pub fn cultures(&self) -> impl Iterator<Item = &str> {
        self.values.cultures.keys().map(String::as_str)
    }

    /// Whether the property has no value for `culture` (or invariant).
    ///
    /// Empty strings and empty arrays count as no value.
    pub fn is_empty(&self, culture: Option<&str>) -> bool {
        match self.get_value(culture) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(a)) => a.is_empty(),
            Some(_) => false,
        }
    }

    /// Stores a set of tags according to `config`.
    ///
    /// `value` may be a delimited string or an array of strings. Tags are
    /// trimmed, empty entries dropped, and duplicates removed while keeping
    /// first-seen order.
    pub fn set_tags_value(
        &mut self,
        value: &Value,
        config: &TagConfiguration,
        culture: Option<&str>,
    ) {
        let delimiter = config.delimiter.unwrap_or(DEFAULT_TAG_DELIMITER);
        let tags = normalize_tags(value, delimiter);
        let stored = match config.storage_type {
            TagStorage::Csv => {
                let mut joined = String::new();
                for (i, tag) in tags.iter().enumerate() {
                    if i > 0 {
                        joined.push(delimiter);
                    }
                    joined.push_str(tag);
                }
                Value::String(joined)
            }
            TagStorage::Json => Value::Array(tags.into_iter().map(Value::String).collect()),
        };
        self.set_value(stored, culture);
    }
}

fn normalize_tags(value: &Value, delimiter: char) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::String(s) => s.split(delimiter).map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    };

    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Delimiter used when neither the data type nor the editor declares one.
pub const DEFAULT_TAG_DELIMITER: char = ',';

/// How a tag property persists its tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagStorage {
    #[default]
    Csv,
    Json,
}

/// Tag behaviour configured on a data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagConfiguration {
    #[serde(default = "default_tag_group")]
    pub group: String,
    #[serde(default)]
    pub storage_type: TagStorage,
    /// `None` means "use the editor's declared delimiter".
    #[serde(default)]
    pub delimiter: Option<char>,
}

fn default_tag_group() -> String {
    "default".to_string()
}

impl Default for TagConfiguration {
    fn default() -> Self {
        Self {
            group: default_tag_group(),
            storage_type: TagStorage::Csv,
            delimiter: None,
        }
    }
}

impl TagConfiguration {
    /// Reads the tag configuration from a data type's configuration object.
    ///
    /// Each field is read on its own; a missing or malformed field keeps its
    /// default without affecting the others.
    pub fn from_data_type_configuration(configuration: &Value) -> Self {
        let mut config = Self::default();
        let Some(fields) = configuration.as_object() else {
            if !configuration.is_null() {
                warn!("Tag configuration is not an object, using defaults");
            }
            return config;
        };

        if let Some(group) = fields.get("group") {
            match group.as_str() {
                Some(group) => config.group = group.to_string(),
                None => warn!("Ignoring tag group {}, expected a string", group),
            }
        }
        if let Some(storage) = fields.get("storageType") {
            match serde_json::from_value::<TagStorage>(storage.clone()) {
                Ok(storage) => config.storage_type = storage,
                Err(e) => warn!("Ignoring tag storage type {}: {}", storage, e),
            }
        }
        if let Some(delimiter) = fields.get("delimiter") {
            match serde_json::from_value::<Option<char>>(delimiter.clone()) {
                Ok(delimiter) => config.delimiter = delimiter,
                Err(e) => warn!("Ignoring tag delimiter {}: {}", delimiter, e),
            }
        }
        config
    }

    /// Returns a copy whose delimiter falls back to `declared` when unset.
    #[must_use]
    pub fn with_fallback_delimiter(&self, declared: char) -> Self {
        Self {
            delimiter: Some(self.delimiter.unwrap_or(declared)),
            ..self.clone()
        }
    }
}
