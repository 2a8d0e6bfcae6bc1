//! The content repository: node persistence, tree maintenance and publishing.

use crate::notifications::NotificationBus;
use crate::schema::SchemaService;
use crate::status::{OperationStatus, PublishResult, PublishStatus};
use crate::{StorageError, StorageResult};
use arbor_model::{ContentNode, invalid_property_aliases};
use arbor_types::{
    ContentEvent, ContentOperation, NodeId, NodeKey, NodePath, ObjectType, Verdict,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Zero-based page request for listing queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page_index: usize,
    pub page_size: usize,
    /// Case-insensitive substring match on the node name.
    pub filter: Option<String>,
}

impl PageQuery {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<&str>) -> Self {
        self.filter = filter.filter(|f| !f.trim().is_empty()).map(str::to_string);
        self
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Persistence and tree operations over documents, media and members.
///
/// Every mutating operation raises its pre-operation event first and
/// reports a veto through its status instead of an error.
pub trait ContentService: Send + Sync {
    fn get_by_id(&self, id: NodeId) -> StorageResult<Option<ContentNode>>;

    fn get_by_key(&self, key: NodeKey) -> StorageResult<Option<ContentNode>>;

    /// Nodes of `object_type` among `ids`, in no particular order.
    fn get_by_ids(
        &self,
        object_type: ObjectType,
        ids: &[NodeId],
    ) -> StorageResult<Vec<ContentNode>>;

    /// Nodes of `object_type` among `keys`, in no particular order.
    fn get_by_keys(
        &self,
        object_type: ObjectType,
        keys: &[NodeKey],
    ) -> StorageResult<Vec<ContentNode>>;

    /// Direct children ordered by sort order.
    fn get_children(
        &self,
        object_type: ObjectType,
        parent: NodeId,
    ) -> StorageResult<Vec<ContentNode>>;

    fn get_paged_children(
        &self,
        object_type: ObjectType,
        parent: NodeId,
        query: &PageQuery,
    ) -> StorageResult<Page<ContentNode>>;

    /// Descendants of every id in `roots`. A root of `-1` lists the whole
    /// tree outside the recycle bin.
    fn get_paged_descendants(
        &self,
        object_type: ObjectType,
        roots: &[NodeId],
        query: &PageQuery,
    ) -> StorageResult<Page<ContentNode>>;

    fn get_all(&self, object_type: ObjectType) -> StorageResult<Vec<ContentNode>>;

    /// Existence probe; never materialises the children.
    fn has_children(&self, id: NodeId) -> StorageResult<bool>;

    /// Saves the draft. New nodes get their id and final path assigned.
    fn save(&self, node: &mut ContentNode, user_id: i32) -> StorageResult<OperationStatus>;

    /// Saves and attempts to publish `node` at `now`.
    ///
    /// A veto persists nothing. Other failures still save the draft but
    /// leave the published state as it was.
    fn save_and_publish(
        &self,
        node: &mut ContentNode,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> StorageResult<PublishResult>;

    /// Saves the draft and submits it for approval.
    fn send_to_publication(&self, node: &mut ContentNode, user_id: i32) -> StorageResult<bool>;

    fn unpublish(&self, id: NodeId, user_id: i32) -> StorageResult<OperationStatus>;

    /// Moves a node and its subtree under `new_parent`.
    fn move_node(
        &self,
        id: NodeId,
        new_parent: NodeId,
        user_id: i32,
    ) -> StorageResult<OperationStatus>;

    /// Copies a node (and its subtree when `recursive`) under `new_parent`.
    /// Returns `None` when vetoed.
    fn copy(
        &self,
        id: NodeId,
        new_parent: NodeId,
        relate_to_original: bool,
        recursive: bool,
        user_id: i32,
    ) -> StorageResult<Option<ContentNode>>;

    fn move_to_recycle_bin(&self, id: NodeId, user_id: i32) -> StorageResult<OperationStatus>;

    /// Deletes a node and its subtree permanently.
    fn delete(&self, id: NodeId, user_id: i32) -> StorageResult<OperationStatus>;

    fn empty_recycle_bin(
        &self,
        object_type: ObjectType,
        user_id: i32,
    ) -> StorageResult<OperationStatus>;

    /// Assigns sort orders following the order of `ids`.
    fn sort(&self, ids: &[NodeId], user_id: i32) -> StorageResult<OperationStatus>;
}

// ── In-memory implementation ────────────────────────────────────

struct Tree {
    nodes: BTreeMap<NodeId, ContentNode>,
    next_id: i32,
}

impl Tree {
    fn get(&self, id: NodeId) -> StorageResult<&ContentNode> {
        self.nodes
            .get(&id)
            .ok_or_else(|| StorageError::NotFound(format!("node {id}")))
    }

    fn parent_path(&self, parent: NodeId) -> StorageResult<NodePath> {
        if parent.is_root() {
            return Ok(NodePath::root());
        }
        Ok(self.get(parent)?.path.clone())
    }

    fn next_sort_order(&self, parent: NodeId) -> i32 {
        self.nodes
            .values()
            .filter(|n| n.parent_id == parent)
            .map(|n| n.sort_order + 1)
            .max()
            .unwrap_or(0)
    }

    fn subtree(&self, path: &NodePath) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.path.starts_with(path))
            .map(|n| n.id)
            .collect()
    }

    /// Rewrites the path of every node under `old` to sit under `new`.
    fn rebase(&mut self, old: &NodePath, new: &NodePath, update: impl Fn(&mut ContentNode)) {
        for node in self.nodes.values_mut() {
            if let Some(path) = node.path.rebase(old, new) {
                node.relocate(path);
                update(node);
            }
        }
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Thread-safe in-process [`ContentService`].
pub struct MemoryContentService {
    tree: RwLock<Tree>,
    schema: Arc<dyn SchemaService>,
    bus: Arc<NotificationBus>,
    content_bin: NodeId,
    media_bin: NodeId,
}

/// First id handed out by an empty service.
const FIRST_NODE_ID: i32 = 1000;

impl MemoryContentService {
    pub fn new(schema: Arc<dyn SchemaService>, bus: Arc<NotificationBus>) -> Self {
        Self {
            tree: RwLock::new(Tree {
                nodes: BTreeMap::new(),
                next_id: FIRST_NODE_ID,
            }),
            schema,
            bus,
            content_bin: NodeId::RECYCLE_BIN_CONTENT,
            media_bin: NodeId::RECYCLE_BIN_MEDIA,
        }
    }

    /// Overrides the recycle-bin ids.
    #[must_use]
    pub fn with_recycle_bins(mut self, content: NodeId, media: NodeId) -> Self {
        self.content_bin = content;
        self.media_bin = media;
        self
    }

    pub fn recycle_bin_for(&self, object_type: ObjectType) -> Option<NodeId> {
        match object_type {
            ObjectType::Document => Some(self.content_bin),
            ObjectType::Media => Some(self.media_bin),
            _ => None,
        }
    }

    /// Loads an already-persisted node verbatim, e.g. from a fixture.
    pub fn insert(&self, node: ContentNode) -> StorageResult<()> {
        if node.is_new() || node.path.node_id() != node.id {
            return Err(StorageError::InvalidData(format!(
                "path {} does not end with node id {}",
                node.path, node.id
            )));
        }
        if node.path.parent_id() != Some(node.parent_id) {
            return Err(StorageError::InvalidData(format!(
                "parent {} of node {} does not match path {}",
                node.parent_id, node.id, node.path
            )));
        }
        let mut tree = self.tree.write()?;
        tree.next_id = tree.next_id.max(node.id.as_i32() + 1);
        tree.nodes.insert(node.id, node);
        Ok(())
    }

    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.tree.read()?.nodes.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    fn raise(
        &self,
        node_id: NodeId,
        object_type: ObjectType,
        user_id: i32,
        operation: ContentOperation,
    ) -> bool {
        let event = ContentEvent::new(node_id, object_type, user_id, operation);
        matches!(self.bus.raise(&event), Verdict::Allow)
    }

    /// Writes `node` into the tree, assigning id and path to new nodes and
    /// keeping tree position and publish state of existing ones.
    fn persist(tree: &mut Tree, node: &mut ContentNode, user_id: i32) -> StorageResult<()> {
        let now = Utc::now();
        if node.is_new() {
            let parent_path = tree.parent_path(node.parent_id)?;
            let id = tree.allocate_id();
            node.id = id;
            node.path = parent_path.child(id);
            node.sort_order = tree.next_sort_order(node.parent_id);
            node.created_at = now;
            node.creator_id = user_id;
            node.published = false;
        } else {
            let stored = tree.get(node.id)?;
            node.path = stored.path.clone();
            node.parent_id = stored.parent_id;
            node.sort_order = stored.sort_order;
            node.trashed = stored.trashed;
            node.published = stored.published;
            node.created_at = stored.created_at;
        }
        node.updated_at = now;
        node.writer_id = user_id;
        node.edited = true;
        tree.nodes.insert(node.id, node.clone());
        Ok(())
    }

    fn path_is_published(tree: &Tree, node: &ContentNode) -> bool {
        node.path
            .ancestors()
            .iter()
            .filter(|id| !id.is_system())
            .all(|id| tree.nodes.get(id).is_some_and(|a| a.published && !a.trashed))
    }

    fn unchanged_since_publish(tree: &Tree, node: &ContentNode) -> bool {
        tree.nodes.get(&node.id).is_some_and(|stored| {
            stored.published
                && !stored.edited
                && stored.name == node.name
                && stored.culture_names == node.culture_names
                && stored.properties == node.properties
                && stored.template_id == node.template_id
        })
    }

    fn invalid_properties(&self, node: &ContentNode) -> StorageResult<Vec<String>> {
        let type_id = node.content_type_id;
        let content_type = self
            .schema
            .content_type(type_id)?
            .ok_or_else(|| StorageError::NotFound(format!("content type {type_id}")))?;
        let mut invalid = invalid_property_aliases(node, &content_type, None);
        for culture in node.culture_names.keys() {
            for alias in invalid_property_aliases(node, &content_type, Some(culture)) {
                if !invalid.contains(&alias) {
                    invalid.push(alias);
                }
            }
        }
        Ok(invalid)
    }

    fn page(mut nodes: Vec<ContentNode>, query: &PageQuery) -> Page<ContentNode> {
        if let Some(filter) = &query.filter {
            let needle = filter.to_lowercase();
            nodes.retain(|n| {
                n.name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            });
        }
        let total = nodes.len();
        let items = nodes
            .into_iter()
            .skip(query.page_index.saturating_mul(query.page_size))
            .take(query.page_size)
            .collect();
        Page { items, total }
    }
}

impl ContentService for MemoryContentService {
    fn get_by_id(&self, id: NodeId) -> StorageResult<Option<ContentNode>> {
        Ok(self.tree.read()?.nodes.get(&id).cloned())
    }

    fn get_by_key(&self, key: NodeKey) -> StorageResult<Option<ContentNode>> {
        Ok(self
            .tree
            .read()?
            .nodes
            .values()
            .find(|n| n.key == key)
            .cloned())
    }

    fn get_by_ids(
        &self,
        object_type: ObjectType,
        ids: &[NodeId],
    ) -> StorageResult<Vec<ContentNode>> {
        let tree = self.tree.read()?;
        Ok(tree
            .nodes
            .values()
            .filter(|n| n.object_type == object_type && ids.contains(&n.id))
            .cloned()
            .collect())
    }

    fn get_by_keys(
        &self,
        object_type: ObjectType,
        keys: &[NodeKey],
    ) -> StorageResult<Vec<ContentNode>> {
        let tree = self.tree.read()?;
        Ok(tree
            .nodes
            .values()
            .filter(|n| n.object_type == object_type && keys.contains(&n.key))
            .cloned()
            .collect())
    }

    fn get_children(
        &self,
        object_type: ObjectType,
        parent: NodeId,
    ) -> StorageResult<Vec<ContentNode>> {
        let tree = self.tree.read()?;
        let mut children: Vec<ContentNode> = tree
            .nodes
            .values()
            .filter(|n| n.object_type == object_type && n.parent_id == parent)
            .cloned()
            .collect();
        children.sort_by_key(|n| (n.sort_order, n.id));
        Ok(children)
    }

    fn get_paged_children(
        &self,
        object_type: ObjectType,
        parent: NodeId,
        query: &PageQuery,
    ) -> StorageResult<Page<ContentNode>> {
        let children = self.get_children(object_type, parent)?;
        Ok(Self::page(children, query))
    }

    fn get_paged_descendants(
        &self,
        object_type: ObjectType,
        roots: &[NodeId],
        query: &PageQuery,
    ) -> StorageResult<Page<ContentNode>> {
        let tree = self.tree.read()?;
        let whole_tree = roots.contains(&NodeId::ROOT);
        let mut nodes: Vec<ContentNode> = tree
            .nodes
            .values()
            .filter(|n| n.object_type == object_type)
            .filter(|n| {
                if whole_tree {
                    !n.trashed
                } else {
                    n.path.ancestors().iter().any(|a| roots.contains(a))
                }
            })
            .cloned()
            .collect();
        nodes.sort_by_key(|n| (n.level(), n.sort_order, n.id));
        Ok(Self::page(nodes, query))
    }

    fn get_all(&self, object_type: ObjectType) -> StorageResult<Vec<ContentNode>> {
        let tree = self.tree.read()?;
        Ok(tree
            .nodes
            .values()
            .filter(|n| n.object_type == object_type)
            .cloned()
            .collect())
    }

    fn has_children(&self, id: NodeId) -> StorageResult<bool> {
        Ok(self.tree.read()?.nodes.values().any(|n| n.parent_id == id))
    }

    fn save(&self, node: &mut ContentNode, user_id: i32) -> StorageResult<OperationStatus> {
        let operation = ContentOperation::Saving {
            is_new: node.is_new(),
        };
        if !self.raise(node.id, node.object_type, user_id, operation) {
            return Ok(OperationStatus::FailedCancelledByEvent);
        }
        let mut tree = self.tree.write()?;
        Self::persist(&mut tree, node, user_id)?;
        debug!("Saved node {} at {}", node.id, node.path);
        Ok(OperationStatus::Success)
    }

    fn save_and_publish(
        &self,
        node: &mut ContentNode,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> StorageResult<PublishResult> {
        let saving = ContentOperation::Saving {
            is_new: node.is_new(),
        };
        if !self.raise(node.id, node.object_type, user_id, saving)
            || !self.raise(node.id, node.object_type, user_id, ContentOperation::Publishing)
        {
            return Ok(PublishResult::new(PublishStatus::FailedCancelledByEvent, node.clone()));
        }

        let invalid = self.invalid_properties(node)?;
        let mut tree = self.tree.write()?;
        let trashed = !node.is_new() && tree.get(node.id)?.trashed;
        let already_published = !node.is_new() && Self::unchanged_since_publish(&tree, node);

        let status = if !invalid.is_empty() {
            PublishStatus::FailedContentInvalid
        } else if trashed {
            PublishStatus::FailedIsTrashed
        } else if node.expire_date.is_some_and(|d| d <= now) {
            PublishStatus::FailedHasExpired
        } else if node.release_date.is_some_and(|d| d > now) {
            PublishStatus::FailedAwaitingRelease
        } else if !Self::path_is_published(&tree, node) {
            PublishStatus::FailedPathNotPublished
        } else if already_published {
            PublishStatus::SuccessAlreadyPublished
        } else {
            PublishStatus::Success
        };

        Self::persist(&mut tree, node, user_id)?;
        if status.is_success() {
            node.published = true;
            node.edited = false;
            tree.nodes.insert(node.id, node.clone());
            info!("Published node {}", node.id);
        } else {
            debug!("Publish of node {} failed: {:?}", node.id, status);
        }

        Ok(PublishResult {
            status,
            node: node.clone(),
            invalid_properties: invalid,
        })
    }

    fn send_to_publication(&self, node: &mut ContentNode, user_id: i32) -> StorageResult<bool> {
        if !self.raise(node.id, node.object_type, user_id, ContentOperation::SendingToPublish) {
            return Ok(false);
        }
        Ok(self.save(node, user_id)? == OperationStatus::Success)
    }

    fn unpublish(&self, id: NodeId, user_id: i32) -> StorageResult<OperationStatus> {
        let object_type = self.tree.read()?.get(id)?.object_type;
        if !self.raise(id, object_type, user_id, ContentOperation::Unpublishing) {
            return Ok(OperationStatus::FailedCancelledByEvent);
        }
        let mut tree = self.tree.write()?;
        let node = tree
            .nodes
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("node {id}")))?;
        if !node.published {
            return Ok(OperationStatus::NoOperation);
        }
        node.published = false;
        node.writer_id = user_id;
        node.updated_at = Utc::now();
        Ok(OperationStatus::Success)
    }

    fn move_node(
        &self,
        id: NodeId,
        new_parent: NodeId,
        user_id: i32,
    ) -> StorageResult<OperationStatus> {
        let object_type = self.tree.read()?.get(id)?.object_type;
        if Some(new_parent) == self.recycle_bin_for(object_type) {
            return self.move_to_recycle_bin(id, user_id);
        }
        if !self.raise(id, object_type, user_id, ContentOperation::Moving { new_parent }) {
            return Ok(OperationStatus::FailedCancelledByEvent);
        }

        let mut tree = self.tree.write()?;
        let old_path = tree.get(id)?.path.clone();
        let parent_path = tree.parent_path(new_parent)?;
        if parent_path.contains(id) {
            return Ok(OperationStatus::FailedCannot);
        }
        let parent_trashed = !new_parent.is_root() && tree.get(new_parent)?.trashed;
        let sort_order = tree.next_sort_order(new_parent);
        let new_path = parent_path.child(id);
        tree.rebase(&old_path, &new_path, |n| n.trashed = parent_trashed);
        if let Some(node) = tree.nodes.get_mut(&id) {
            node.sort_order = sort_order;
            node.writer_id = user_id;
        }
        debug!("Moved node {} from {} to {}", id, old_path, new_path);
        Ok(OperationStatus::Success)
    }

    fn copy(
        &self,
        id: NodeId,
        new_parent: NodeId,
        relate_to_original: bool,
        recursive: bool,
        user_id: i32,
    ) -> StorageResult<Option<ContentNode>> {
        let object_type = self.tree.read()?.get(id)?.object_type;
        let operation = ContentOperation::Copying {
            new_parent,
            recursive,
        };
        if !self.raise(id, object_type, user_id, operation) {
            return Ok(None);
        }

        let mut tree = self.tree.write()?;
        let source = tree.get(id)?.clone();
        let parent_path = tree.parent_path(new_parent)?;
        let mut originals: Vec<ContentNode> = if recursive {
            tree.subtree(&source.path)
                .into_iter()
                .filter_map(|i| tree.nodes.get(&i).cloned())
                .collect()
        } else {
            vec![source.clone()]
        };
        originals.sort_by_key(|n| (n.level(), n.sort_order, n.id));

        let now = Utc::now();
        let mut new_paths: HashMap<NodeId, NodePath> = HashMap::new();
        let mut root_copy = None;
        for original in originals {
            let copy_parent_path = if original.id == source.id {
                parent_path.clone()
            } else {
                match new_paths.get(&original.parent_id) {
                    Some(p) => p.clone(),
                    None => continue,
                }
            };
            let new_id = tree.allocate_id();
            let mut copy = original.clone();
            copy.id = new_id;
            copy.key = NodeKey::new();
            copy.relocate(copy_parent_path.child(new_id));
            copy.published = false;
            copy.edited = true;
            copy.trashed = false;
            copy.created_at = now;
            copy.updated_at = now;
            copy.creator_id = user_id;
            copy.writer_id = user_id;
            copy.related_to = None;
            if original.id == source.id {
                copy.sort_order = tree.next_sort_order(new_parent);
                if relate_to_original {
                    copy.related_to = Some(source.id);
                }
                root_copy = Some(copy.clone());
            }
            new_paths.insert(original.id, copy.path.clone());
            tree.nodes.insert(new_id, copy);
        }

        if let Some(copy) = &root_copy {
            debug!("Copied node {} to {} at {}", id, copy.id, copy.path);
        }
        Ok(root_copy)
    }

    fn move_to_recycle_bin(&self, id: NodeId, user_id: i32) -> StorageResult<OperationStatus> {
        let object_type = self.tree.read()?.get(id)?.object_type;
        let Some(bin) = self.recycle_bin_for(object_type) else {
            return Ok(OperationStatus::FailedCannot);
        };
        if !self.raise(id, object_type, user_id, ContentOperation::Trashing) {
            return Ok(OperationStatus::FailedCancelledByEvent);
        }

        let mut tree = self.tree.write()?;
        let old_path = tree.get(id)?.path.clone();
        let new_path = NodePath::root().child(bin).child(id);
        tree.rebase(&old_path, &new_path, |n| {
            n.trashed = true;
            n.published = false;
        });
        info!("Moved node {} to recycle bin {}", id, bin);
        Ok(OperationStatus::Success)
    }

    fn delete(&self, id: NodeId, user_id: i32) -> StorageResult<OperationStatus> {
        let object_type = self.tree.read()?.get(id)?.object_type;
        if !self.raise(id, object_type, user_id, ContentOperation::Deleting) {
            return Ok(OperationStatus::FailedCancelledByEvent);
        }
        let mut tree = self.tree.write()?;
        let path = tree.get(id)?.path.clone();
        let doomed = tree.subtree(&path);
        for node_id in &doomed {
            tree.nodes.remove(node_id);
        }
        info!("Deleted node {} and {} descendants", id, doomed.len().saturating_sub(1));
        Ok(OperationStatus::Success)
    }

    fn empty_recycle_bin(
        &self,
        object_type: ObjectType,
        user_id: i32,
    ) -> StorageResult<OperationStatus> {
        let Some(bin) = self.recycle_bin_for(object_type) else {
            return Ok(OperationStatus::FailedCannot);
        };
        if !self.raise(bin, object_type, user_id, ContentOperation::EmptyingRecycleBin) {
            return Ok(OperationStatus::FailedCancelledByEvent);
        }
        let mut tree = self.tree.write()?;
        let before = tree.nodes.len();
        tree.nodes
            .retain(|_, n| !(n.object_type == object_type && n.path.contains(bin)));
        let removed = before - tree.nodes.len();
        info!("Emptied recycle bin {} ({} nodes)", bin, removed);
        Ok(if removed == 0 {
            OperationStatus::NoOperation
        } else {
            OperationStatus::Success
        })
    }

    fn sort(&self, ids: &[NodeId], user_id: i32) -> StorageResult<OperationStatus> {
        let Some(first) = ids.first() else {
            return Ok(OperationStatus::NoOperation);
        };
        let (object_type, parent) = {
            let tree = self.tree.read()?;
            for id in ids {
                tree.get(*id)?;
            }
            let node = tree.get(*first)?;
            (node.object_type, node.parent_id)
        };
        if !self.raise(parent, object_type, user_id, ContentOperation::Sorting { parent }) {
            return Ok(OperationStatus::FailedCancelledByEvent);
        }
        let mut tree = self.tree.write()?;
        for (index, id) in ids.iter().enumerate() {
            if let Some(node) = tree.nodes.get_mut(id) {
                node.sort_order = i32::try_from(index).unwrap_or(i32::MAX);
                node.writer_id = user_id;
            }
        }
        Ok(OperationStatus::Success)
    }
}
