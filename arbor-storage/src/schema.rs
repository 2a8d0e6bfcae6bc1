//! Content-type and data-type lookups.
//!
//! Administrative edits can replace the schema while requests are running;
//! every lookup returns an owned snapshot.

use crate::StorageResult;
use arbor_model::{ContentType, DataType};
use arbor_types::{NodeKey, ObjectType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Resolves content types and data types.
pub trait SchemaService: Send + Sync {
    fn content_type(&self, id: i32) -> StorageResult<Option<ContentType>>;

    fn content_type_by_alias(&self, alias: &str) -> StorageResult<Option<ContentType>>;

    /// All content types, optionally restricted to one object type.
    fn content_types(&self, object_type: Option<ObjectType>) -> StorageResult<Vec<ContentType>>;

    fn data_type(&self, id: i32) -> StorageResult<Option<DataType>>;

    fn data_type_by_key(&self, key: NodeKey) -> StorageResult<Option<DataType>>;

    fn data_types(&self) -> StorageResult<Vec<DataType>>;
}

/// Serializable schema snapshot, used for fixtures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub content_types: Vec<ContentType>,
    #[serde(default)]
    pub data_types: Vec<DataType>,
}

#[derive(Default)]
struct SchemaState {
    content_types: BTreeMap<i32, ContentType>,
    data_types: BTreeMap<i32, DataType>,
}

/// In-process [`SchemaService`].
#[derive(Default)]
pub struct MemorySchemaService {
    state: RwLock<SchemaState>,
}

impl MemorySchemaService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: SchemaSnapshot) -> StorageResult<Self> {
        let service = Self::new();
        for ct in snapshot.content_types {
            service.put_content_type(ct)?;
        }
        for dt in snapshot.data_types {
            service.put_data_type(dt)?;
        }
        Ok(service)
    }

    /// Adds or replaces a content type.
    pub fn put_content_type(&self, content_type: ContentType) -> StorageResult<()> {
        self.state.write()?.content_types.insert(content_type.id, content_type);
        Ok(())
    }

    pub fn remove_content_type(&self, id: i32) -> StorageResult<Option<ContentType>> {
        Ok(self.state.write()?.content_types.remove(&id))
    }

    /// Adds or replaces a data type.
    pub fn put_data_type(&self, data_type: DataType) -> StorageResult<()> {
        self.state.write()?.data_types.insert(data_type.id, data_type);
        Ok(())
    }

    pub fn remove_data_type(&self, id: i32) -> StorageResult<Option<DataType>> {
        Ok(self.state.write()?.data_types.remove(&id))
    }
}

impl SchemaService for MemorySchemaService {
    fn content_type(&self, id: i32) -> StorageResult<Option<ContentType>> {
        Ok(self.state.read()?.content_types.get(&id).cloned())
    }

    fn content_type_by_alias(&self, alias: &str) -> StorageResult<Option<ContentType>> {
        Ok(self
            .state
            .read()?
            .content_types
            .values()
            .find(|ct| ct.alias == alias)
            .cloned())
    }

    fn content_types(&self, object_type: Option<ObjectType>) -> StorageResult<Vec<ContentType>> {
        Ok(self
            .state
            .read()?
            .content_types
            .values()
            .filter(|ct| object_type.is_none_or(|ot| ct.object_type == ot))
            .cloned()
            .collect())
    }

    fn data_type(&self, id: i32) -> StorageResult<Option<DataType>> {
        Ok(self.state.read()?.data_types.get(&id).cloned())
    }

    fn data_type_by_key(&self, key: NodeKey) -> StorageResult<Option<DataType>> {
        Ok(self
            .state
            .read()?
            .data_types
            .values()
            .find(|dt| dt.key == key)
            .cloned())
    }

    fn data_types(&self) -> StorageResult<Vec<DataType>> {
        Ok(self.state.read()?.data_types.values().cloned().collect())
    }
}
