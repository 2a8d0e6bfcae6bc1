//! Records that are addressable through the back office but do not live in
//! the node tree.

use crate::entity::EntitySummary;
use crate::fields::{FieldAccess, FieldKind, FieldValue};
use crate::schema::{PropertyGroup, PropertyType};
use arbor_types::{EntityKind, NodeId, NodeKey};
use serde::{Deserialize, Serialize};

/// A rendering template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: i32,
    pub key: NodeKey,
    pub alias: String,
    pub name: String,
    #[serde(default)]
    pub path: String,
}

impl Template {
    #[must_use]
    pub fn to_summary(&self) -> EntitySummary {
        EntitySummary::flat(EntityKind::Template, NodeId::new(self.id), Some(self.key), &self.name)
            .with_alias(&self.alias)
    }
}

impl FieldAccess for Template {
    fn field_kinds() -> &'static [(&'static str, FieldKind)] {
        &[
            ("Id", FieldKind::Int),
            ("Key", FieldKind::Key),
            ("Alias", FieldKind::Text),
            ("Name", FieldKind::Text),
            ("Path", FieldKind::Text),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Id" => self.id.into(),
            "Key" => self.key.as_uuid().into(),
            "Alias" => self.alias.as_str().into(),
            "Name" => self.name.as_str().into(),
            "Path" => self.path.as_str().into(),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    pub id: i32,
    pub key: NodeKey,
    pub alias: String,
    pub name: String,
}

impl Macro {
    #[must_use]
    pub fn to_summary(&self) -> EntitySummary {
        EntitySummary::flat(EntityKind::Macro, NodeId::new(self.id), Some(self.key), &self.name)
            .with_alias(&self.alias)
    }
}

impl FieldAccess for Macro {
    fn field_kinds() -> &'static [(&'static str, FieldKind)] {
        &[
            ("Id", FieldKind::Int),
            ("Key", FieldKind::Key),
            ("Alias", FieldKind::Text),
            ("Name", FieldKind::Text),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Id" => self.id.into(),
            "Key" => self.key.as_uuid().into(),
            "Alias" => self.alias.as_str().into(),
            "Name" => self.name.as_str().into(),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: i32,
    pub iso_code: String,
    pub culture_name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_mandatory: bool,
}

impl Language {
    #[must_use]
    pub fn to_summary(&self) -> EntitySummary {
        EntitySummary::flat(EntityKind::Language, NodeId::new(self.id), None, &self.culture_name)
            .with_alias(&self.iso_code)
            .with_data("isDefault", self.is_default.into())
    }
}

/// A translation key. Items nest through `parent_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryItem {
    pub id: i32,
    pub key: NodeKey,
    pub item_key: String,
    #[serde(default)]
    pub parent_key: Option<NodeKey>,
}

impl DictionaryItem {
    /// Summary at `level` (1 for top-level items).
    #[must_use]
    pub fn to_summary(&self, level: usize) -> EntitySummary {
        let mut summary = EntitySummary::flat(
            EntityKind::DictionaryItem,
            NodeId::new(self.id),
            Some(self.key),
            &self.item_key,
        );
        summary.level = level;
        summary
    }
}

/// A back-office user and the tree roots they may browse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub key: NodeKey,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_true")]
    pub is_approved: bool,
    #[serde(default = "root_only")]
    pub content_start_nodes: Vec<NodeId>,
    #[serde(default = "root_only")]
    pub media_start_nodes: Vec<NodeId>,
}

fn default_true() -> bool {
    true
}

fn root_only() -> Vec<NodeId> {
    vec![NodeId::ROOT]
}

impl User {
    /// Creates an approved user whose start nodes are the roots of both trees.
    pub fn new(id: i32, name: &str) -> Self {
        Self {
            id,
            key: NodeKey::new(),
            name: name.into(),
            username: name.to_lowercase(),
            email: String::new(),
            is_approved: true,
            content_start_nodes: root_only(),
            media_start_nodes: root_only(),
        }
    }

    #[must_use]
    pub fn with_content_start_nodes(mut self, nodes: Vec<NodeId>) -> Self {
        self.content_start_nodes = nodes;
        self
    }

    #[must_use]
    pub fn with_media_start_nodes(mut self, nodes: Vec<NodeId>) -> Self {
        self.media_start_nodes = nodes;
        self
    }

    /// Start nodes governing access to `kind`'s tree. Other kinds are
    /// unscoped and yield the root.
    pub fn start_nodes(&self, kind: EntityKind) -> &[NodeId] {
        match kind {
            EntityKind::Document => &self.content_start_nodes,
            EntityKind::Media => &self.media_start_nodes,
            _ => &[NodeId::ROOT],
        }
    }

    #[must_use]
    pub fn to_summary(&self) -> EntitySummary {
        EntitySummary::flat(EntityKind::User, NodeId::new(self.id), Some(self.key), &self.name)
            .with_data("email", self.email.clone().into())
    }
}

impl FieldAccess for User {
    fn field_kinds() -> &'static [(&'static str, FieldKind)] {
        &[
            ("Id", FieldKind::Int),
            ("Key", FieldKind::Key),
            ("Name", FieldKind::Text),
            ("Username", FieldKind::Text),
            ("Email", FieldKind::Text),
            ("IsApproved", FieldKind::Bool),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Id" => self.id.into(),
            "Key" => self.key.as_uuid().into(),
            "Name" => self.name.as_str().into(),
            "Username" => self.username.as_str().into(),
            "Email" => self.email.as_str().into(),
            "IsApproved" => self.is_approved.into(),
            _ => return None,
        })
    }
}

/// A stylesheet file. Identified by its relative path only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stylesheet {
    pub path: String,
    pub name: String,
}

impl Stylesheet {
    #[must_use]
    pub fn to_summary(&self) -> EntitySummary {
        let mut summary =
            EntitySummary::flat(EntityKind::Stylesheet, NodeId::UNSAVED, None, &self.name);
        summary.path = self.path.clone();
        summary
    }
}

/// A hostname bound to a content root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub root_content_id: Option<NodeId>,
    #[serde(default)]
    pub language_iso: Option<String>,
}

impl Domain {
    #[must_use]
    pub fn to_summary(&self) -> EntitySummary {
        let id = NodeId::new(self.id);
        let mut summary = EntitySummary::flat(EntityKind::Domain, id, None, &self.name);
        if let Some(root) = self.root_content_id {
            summary.parent_id = root;
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberGroup {
    pub id: i32,
    pub key: NodeKey,
    pub name: String,
}

impl MemberGroup {
    #[must_use]
    pub fn to_summary(&self) -> EntitySummary {
        let id = NodeId::new(self.id);
        EntitySummary::flat(EntityKind::MemberGroup, id, Some(self.key), &self.name)
    }
}

impl PropertyType {
    #[must_use]
    pub fn to_summary(&self) -> EntitySummary {
        let id = NodeId::new(self.id);
        EntitySummary::flat(EntityKind::PropertyType, id, Some(self.key), &self.name)
            .with_alias(&self.alias)
    }
}

impl FieldAccess for PropertyType {
    fn field_kinds() -> &'static [(&'static str, FieldKind)] {
        &[
            ("Id", FieldKind::Int),
            ("Key", FieldKind::Key),
            ("Alias", FieldKind::Text),
            ("Name", FieldKind::Text),
            ("DataTypeId", FieldKind::Int),
            ("Mandatory", FieldKind::Bool),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Id" => self.id.into(),
            "Key" => self.key.as_uuid().into(),
            "Alias" => self.alias.as_str().into(),
            "Name" => self.name.as_str().into(),
            "DataTypeId" => self.data_type_id.into(),
            "Mandatory" => self.mandatory.into(),
            _ => return None,
        })
    }
}

impl PropertyGroup {
    #[must_use]
    pub fn to_summary(&self) -> EntitySummary {
        let id = NodeId::new(self.id);
        EntitySummary::flat(EntityKind::PropertyGroup, id, Some(self.key), &self.name)
            .with_alias(&self.alias)
    }
}

impl FieldAccess for PropertyGroup {
    fn field_kinds() -> &'static [(&'static str, FieldKind)] {
        &[
            ("Id", FieldKind::Int),
            ("Key", FieldKind::Key),
            ("Alias", FieldKind::Text),
            ("Name", FieldKind::Text),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Id" => self.id.into(),
            "Key" => self.key.as_uuid().into(),
            "Alias" => self.alias.as_str().into(),
            "Name" => self.name.as_str().into(),
            _ => return None,
        })
    }
}
