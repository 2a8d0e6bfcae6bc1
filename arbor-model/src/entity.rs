use crate::fields::{FieldAccess, FieldKind, FieldValue};
use crate::property::Property;
use crate::schema::ContentType;
use arbor_types::{EntityKind, NodeId, NodeKey, NodePath, ObjectType, Udi};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node in one of the document, media or member trees.
///
/// `path` always starts at the root and ends with the node's own id;
/// `parent_id` equals the path's second-to-last segment. Unsaved nodes
/// carry id `0` in both places until the content service assigns one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: NodeId,
    pub key: NodeKey,
    pub object_type: ObjectType,
    pub content_type_id: i32,
    pub content_type_alias: String,
    pub parent_id: NodeId,
    pub path: NodePath,
    #[serde(default)]
    pub sort_order: i32,
    /// Invariant name. For culture-variant nodes this mirrors the default
    /// culture's name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub culture_names: BTreeMap<String, String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub published: bool,
    /// Draft differs from the published version.
    #[serde(default)]
    pub edited: bool,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expire_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub template_id: Option<i32>,
    #[serde(default)]
    pub creator_id: i32,
    #[serde(default)]
    pub writer_id: i32,
    /// Original node when this node was produced by a related copy.
    #[serde(default)]
    pub related_to: Option<NodeId>,
}

impl ContentNode {
    /// Creates an unsaved node of `content_type` beneath `parent`, with one
    /// empty property per property type.
    pub fn scaffold(content_type: &ContentType, parent: &NodePath, creator_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: NodeId::UNSAVED,
            key: NodeKey::new(),
            object_type: content_type.object_type,
            content_type_id: content_type.id,
            content_type_alias: content_type.alias.clone(),
            parent_id: parent.node_id(),
            path: parent.child(NodeId::UNSAVED),
            sort_order: 0,
            name: None,
            culture_names: BTreeMap::new(),
            properties: content_type
                .property_types
                .iter()
                .map(|pt| Property::new(pt.alias.clone()))
                .collect(),
            created_at: now,
            updated_at: now,
            trashed: false,
            published: false,
            edited: true,
            release_date: None,
            expire_date: None,
            template_id: None,
            creator_id,
            writer_id: creator_id,
            related_to: None,
        }
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.id.is_unsaved()
    }

    /// Depth below the root.
    #[must_use]
    pub fn level(&self) -> usize {
        self.path.level()
    }

    pub fn property(&self, alias: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.alias == alias)
    }

    pub fn property_mut(&mut self, alias: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.alias == alias)
    }

    /// Returns the property, adding an empty one first if the node lacks it.
    pub fn property_or_insert(&mut self, alias: &str) -> &mut Property {
        let index = match self.properties.iter().position(|p| p.alias == alias) {
            Some(i) => i,
            None => {
                self.properties.push(Property::new(alias));
                self.properties.len() - 1
            }
        };
        &mut self.properties[index]
    }

    /// Name for `culture`, falling back to the invariant name.
    pub fn name_for(&self, culture: Option<&str>) -> Option<&str> {
        culture
            .and_then(|c| self.culture_names.get(c))
            .or(self.name.as_ref())
            .map(String::as_str)
    }

    /// Sets the name for `culture`, or the invariant name for `None`.
    pub fn set_name(&mut self, name: impl Into<String>, culture: Option<&str>) {
        let name = name.into();
        match culture {
            Some(c) => {
                self.culture_names.insert(c.to_string(), name);
            }
            None => self.name = Some(name),
        }
    }

    /// Whether the node has a non-blank name in any slot.
    #[must_use]
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
            || self.culture_names.values().any(|n| !n.trim().is_empty())
    }

    /// Moves the node (not its descendants) to `path`, keeping `parent_id`
    /// consistent.
    pub fn relocate(&mut self, path: NodePath) {
        self.parent_id = path.parent_id().unwrap_or(NodeId::ROOT);
        self.path = path;
    }

    /// Lightweight summary used by listing endpoints.
    #[must_use]
    pub fn to_summary(&self, has_children: bool) -> EntitySummary {
        let kind = self.object_type.entity_kind();
        EntitySummary {
            id: self.id,
            key: Some(self.key),
            name: self.name.clone().unwrap_or_default(),
            kind,
            parent_id: self.parent_id,
            path: self.path.to_string(),
            level: self.level(),
            sort_order: self.sort_order,
            trashed: self.trashed,
            has_children,
            alias: Some(self.content_type_alias.clone()),
            udi: Some(Udi::new(kind, self.key)),
            additional_data: BTreeMap::new(),
        }
    }
}

/// Kind-agnostic projection of any addressable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub id: NodeId,
    pub key: Option<NodeKey>,
    pub name: String,
    pub kind: EntityKind,
    pub parent_id: NodeId,
    pub path: String,
    pub level: usize,
    pub sort_order: i32,
    pub trashed: bool,
    pub has_children: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udi: Option<Udi>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_data: BTreeMap<String, serde_json::Value>,
}

impl EntitySummary {
    /// A summary for a record that does not live in a node tree.
    pub fn flat(
        kind: EntityKind,
        id: NodeId,
        key: Option<NodeKey>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            key,
            name: name.into(),
            kind,
            parent_id: NodeId::ROOT,
            path: format!("{},{}", NodeId::ROOT, id),
            level: 1,
            sort_order: 0,
            trashed: false,
            has_children: false,
            alias: None,
            udi: key.map(|k| Udi::new(kind, k)),
            additional_data: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.additional_data.insert(key.to_string(), value);
        self
    }
}

impl FieldAccess for EntitySummary {
    fn field_kinds() -> &'static [(&'static str, FieldKind)] {
        &[
            ("Id", FieldKind::Int),
            ("Key", FieldKind::Key),
            ("Name", FieldKind::Text),
            ("ParentId", FieldKind::Int),
            ("Path", FieldKind::Text),
            ("Level", FieldKind::Int),
            ("SortOrder", FieldKind::Int),
            ("Trashed", FieldKind::Bool),
            ("HasChildren", FieldKind::Bool),
            ("Alias", FieldKind::Text),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Id" => self.id.as_i32().into(),
            "Key" => self.key.map(|k| k.as_uuid()).into(),
            "Name" => self.name.as_str().into(),
            "ParentId" => self.parent_id.as_i32().into(),
            "Path" => self.path.as_str().into(),
            "Level" => self.level.into(),
            "SortOrder" => self.sort_order.into(),
            "Trashed" => self.trashed.into(),
            "HasChildren" => self.has_children.into(),
            "Alias" => self.alias.clone().into(),
            _ => return None,
        })
    }
}
