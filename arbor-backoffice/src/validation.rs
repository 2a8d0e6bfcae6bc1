//! Validation state collected while a save request is processed.
//!
//! Keys follow the editor's form layout:
//!
//! - `Name` (or `Name.<culture>`) for the node name
//! - `_Properties.<alias>` (or `_Properties.<alias>.<culture>`) for fields
//! - `permission` when the acting user lacks a required permission

use arbor_model::PropertyViolation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NAME_KEY: &str = "Name";
pub const PERMISSION_KEY: &str = "permission";
const PROPERTY_PREFIX: &str = "_Properties";

/// Error messages grouped by form key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationState {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(key.into()).or_default().push(message.into());
    }

    pub fn add_property_error(
        &mut self,
        alias: &str,
        culture: Option<&str>,
        message: impl Into<String>,
    ) {
        self.add_error(property_key(alias, culture), message);
    }

    pub fn add_name_error(&mut self, culture: Option<&str>, message: impl Into<String>) {
        let key = match culture {
            Some(c) => format!("{NAME_KEY}.{c}"),
            None => NAME_KEY.to_string(),
        };
        self.add_error(key, message);
    }

    /// Records a model-level property violation.
    pub fn add_violation(
        &mut self,
        alias: &str,
        culture: Option<&str>,
        violation: &PropertyViolation,
    ) {
        let message = match violation {
            PropertyViolation::Mandatory => "Value cannot be empty".to_string(),
            PropertyViolation::Pattern(p) => format!("Value does not match pattern {p}"),
        };
        self.add_property_error(alias, culture, message);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.errors.contains_key(key)
    }

    pub fn messages(&self, key: &str) -> &[String] {
        self.errors.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_error_model(&self, message: impl Into<String>) -> ErrorModel {
        ErrorModel {
            message: message.into(),
            model_state: self.errors.clone(),
        }
    }
}

/// Form key for a property.
pub fn property_key(alias: &str, culture: Option<&str>) -> String {
    match culture {
        Some(c) => format!("{PROPERTY_PREFIX}.{alias}.{c}"),
        None => format!("{PROPERTY_PREFIX}.{alias}"),
    }
}

/// Serialized validation payload attached to a rejected representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorModel {
    pub message: String,
    pub model_state: BTreeMap<String, Vec<String>>,
}
