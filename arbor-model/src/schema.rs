use crate::{ModelError, ModelResult};
use arbor_types::{NodeKey, ObjectType};
use serde::{Deserialize, Serialize};

/// The user-defined schema of a document, media item or member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentType {
    pub id: i32,
    pub key: NodeKey,
    pub alias: String,
    pub name: String,
    pub object_type: ObjectType,
    #[serde(default)]
    pub allowed_as_root: bool,
    /// Ids of content types that may be created beneath nodes of this type.
    #[serde(default)]
    pub allowed_children: Vec<i32>,
    #[serde(default)]
    pub property_types: Vec<PropertyType>,
    #[serde(default)]
    pub groups: Vec<PropertyGroup>,
    #[serde(default)]
    pub varies_by_culture: bool,
    /// Templates a document of this type may render with.
    #[serde(default)]
    pub allowed_templates: Vec<i32>,
}

impl ContentType {
    /// Looks up a property type by alias.
    pub fn property_type(&self, alias: &str) -> Option<&PropertyType> {
        self.property_types.iter().find(|p| p.alias == alias)
    }

    /// Like [`property_type`](Self::property_type) but fails for unknown aliases.
    pub fn require_property_type(&self, alias: &str) -> ModelResult<&PropertyType> {
        self.property_type(alias)
            .ok_or_else(|| ModelError::UnknownProperty(alias.to_string()))
    }

    /// Whether nodes of `child_type_id` may be placed under nodes of this type.
    pub fn allows_child(&self, child_type_id: i32) -> bool {
        self.allowed_children.contains(&child_type_id)
    }
}

/// A field definition within a [`ContentType`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyType {
    pub id: i32,
    pub key: NodeKey,
    pub alias: String,
    pub name: String,
    pub data_type_id: i32,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<String>,
    #[serde(default)]
    pub varies_by_culture: bool,
}

impl PropertyType {
    /// Shorthand for an optional, invariant property.
    pub fn new(id: i32, alias: &str, name: &str, data_type_id: i32) -> Self {
        Self {
            id,
            key: NodeKey::new(),
            alias: alias.into(),
            name: name.into(),
            data_type_id,
            mandatory: false,
            validation_regex: None,
            varies_by_culture: false,
        }
    }

    #[must_use]
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    #[must_use]
    pub fn with_regex(mut self, regex: &str) -> Self {
        self.validation_regex = Some(regex.into());
        self
    }

    #[must_use]
    pub fn varying_by_culture(mut self) -> Self {
        self.varies_by_culture = true;
        self
    }
}

/// A named tab/group of properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyGroup {
    pub id: i32,
    pub key: NodeKey,
    pub alias: String,
    pub name: String,
    #[serde(default)]
    pub property_aliases: Vec<String>,
}

/// A configured property editor instance. Several property types can share
/// one data type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataType {
    pub id: i32,
    pub key: NodeKey,
    pub name: String,
    /// Alias of the value converter that handles this data type.
    pub editor_alias: String,
    #[serde(default)]
    pub configuration: serde_json::Value,
    /// Pickers of this data type browse the whole tree regardless of the
    /// user's start nodes.
    #[serde(default)]
    pub ignore_user_start_nodes: bool,
}
