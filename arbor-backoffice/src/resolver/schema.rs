//! Lookups for content types, data types and their parts.

use super::KindStrategy;
use crate::error::{BackofficeError, BackofficeResult};
use crate::filter::CompiledFilter;
use arbor_model::{ContentType, DataType, EntitySummary, PropertyGroup, PropertyType};
use arbor_storage::SchemaService;
use arbor_types::{EntityKind, NodeId, NodeKey, ObjectType};
use std::collections::HashSet;
use std::sync::Arc;

fn content_type_summary(kind: EntityKind, content_type: &ContentType) -> EntitySummary {
    EntitySummary::flat(
        kind,
        NodeId::new(content_type.id),
        Some(content_type.key),
        &content_type.name,
    )
    .with_alias(&content_type.alias)
}

fn data_type_summary(data_type: &DataType) -> EntitySummary {
    EntitySummary::flat(
        EntityKind::DataType,
        NodeId::new(data_type.id),
        Some(data_type.key),
        &data_type.name,
    )
    .with_data("editorAlias", data_type.editor_alias.clone().into())
}

/// Document, media and member types.
pub struct ContentTypeStrategy {
    schema: Arc<dyn SchemaService>,
}

impl ContentTypeStrategy {
    pub fn new(schema: Arc<dyn SchemaService>) -> Self {
        Self { schema }
    }

    /// Object type of the nodes a type of `kind` describes.
    fn described(kind: EntityKind) -> BackofficeResult<ObjectType> {
        match kind {
            EntityKind::DocumentType => Ok(ObjectType::Document),
            EntityKind::MediaType => Ok(ObjectType::Media),
            EntityKind::MemberType => Ok(ObjectType::Member),
            other => Err(BackofficeError::not_supported_kind(other, "content type lookup")),
        }
    }

    fn content_types(&self, kind: EntityKind) -> BackofficeResult<Vec<ContentType>> {
        Ok(self.schema.content_types(Some(Self::described(kind)?))?)
    }
}

impl KindStrategy for ContentTypeStrategy {
    fn resolve_by_id(
        &self,
        kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        let object_type = Self::described(kind)?;
        Ok(self
            .schema
            .content_type(id.as_i32())?
            .filter(|ct| ct.object_type == object_type)
            .map(|ct| content_type_summary(kind, &ct)))
    }

    fn resolve_by_key(
        &self,
        kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self
            .content_types(kind)?
            .iter()
            .find(|ct| ct.key == key)
            .map(|ct| content_type_summary(kind, ct)))
    }

    fn resolve_all(
        &self,
        kind: EntityKind,
        filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let summaries = self
            .content_types(kind)?
            .iter()
            .map(|ct| content_type_summary(kind, ct))
            .collect::<Vec<_>>();
        Ok(filter.apply(summaries))
    }
}

pub struct DataTypeStrategy {
    schema: Arc<dyn SchemaService>,
}

impl DataTypeStrategy {
    pub fn new(schema: Arc<dyn SchemaService>) -> Self {
        Self { schema }
    }
}

impl KindStrategy for DataTypeStrategy {
    fn resolve_by_id(
        &self,
        _kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self.schema.data_type(id.as_i32())?.as_ref().map(data_type_summary))
    }

    fn resolve_by_key(
        &self,
        _kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self.schema.data_type_by_key(key)?.as_ref().map(data_type_summary))
    }

    fn resolve_all(
        &self,
        _kind: EntityKind,
        filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let summaries = self.schema.data_types()?.iter().map(data_type_summary).collect::<Vec<_>>();
        Ok(filter.apply(summaries))
    }
}

/// Property types across every content type, one per alias.
pub struct PropertyTypeStrategy {
    schema: Arc<dyn SchemaService>,
}

impl PropertyTypeStrategy {
    pub fn new(schema: Arc<dyn SchemaService>) -> Self {
        Self { schema }
    }

    fn property_types(&self) -> BackofficeResult<Vec<PropertyType>> {
        let mut seen = HashSet::new();
        Ok(self
            .schema
            .content_types(None)?
            .into_iter()
            .flat_map(|ct| ct.property_types)
            .filter(|pt| seen.insert(pt.alias.clone()))
            .collect())
    }
}

impl KindStrategy for PropertyTypeStrategy {
    fn resolve_by_id(
        &self,
        _kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self
            .property_types()?
            .iter()
            .find(|pt| pt.id == id.as_i32())
            .map(PropertyType::to_summary))
    }

    fn resolve_by_key(
        &self,
        _kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self
            .property_types()?
            .iter()
            .find(|pt| pt.key == key)
            .map(PropertyType::to_summary))
    }

    fn resolve_all(
        &self,
        _kind: EntityKind,
        filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(filter
            .apply(self.property_types()?)
            .iter()
            .map(PropertyType::to_summary)
            .collect())
    }
}

/// Property groups across every content type, one per name.
pub struct PropertyGroupStrategy {
    schema: Arc<dyn SchemaService>,
}

impl PropertyGroupStrategy {
    pub fn new(schema: Arc<dyn SchemaService>) -> Self {
        Self { schema }
    }

    fn groups(&self) -> BackofficeResult<Vec<PropertyGroup>> {
        let mut seen = HashSet::new();
        Ok(self
            .schema
            .content_types(None)?
            .into_iter()
            .flat_map(|ct| ct.groups)
            .filter(|group| seen.insert(group.name.clone()))
            .collect())
    }
}

impl KindStrategy for PropertyGroupStrategy {
    fn resolve_by_id(
        &self,
        _kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self
            .groups()?
            .iter()
            .find(|group| group.id == id.as_i32())
            .map(PropertyGroup::to_summary))
    }

    fn resolve_by_key(
        &self,
        _kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self
            .groups()?
            .iter()
            .find(|group| group.key == key)
            .map(PropertyGroup::to_summary))
    }

    fn resolve_all(
        &self,
        _kind: EntityKind,
        filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(filter
            .apply(self.groups()?)
            .iter()
            .map(PropertyGroup::to_summary)
            .collect())
    }
}
