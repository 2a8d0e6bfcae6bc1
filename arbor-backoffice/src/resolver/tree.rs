//! Lookups for documents, media and members in the node tree.

use super::{KindStrategy, Scope};
use crate::error::{BackofficeError, BackofficeResult};
use crate::filter::CompiledFilter;
use arbor_model::{ContentNode, EntitySummary};
use arbor_storage::{ContentService, Page, PageQuery};
use arbor_types::{EntityKind, NodeId, NodeKey, ObjectType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct TreeStrategy {
    content: Arc<dyn ContentService>,
}

impl TreeStrategy {
    pub fn new(content: Arc<dyn ContentService>) -> Self {
        Self { content }
    }

    fn object_type(kind: EntityKind) -> BackofficeResult<ObjectType> {
        kind.object_type()
            .ok_or_else(|| BackofficeError::not_supported_kind(kind, "tree lookup"))
    }

    fn summarize(&self, node: &ContentNode) -> BackofficeResult<EntitySummary> {
        Ok(node.to_summary(self.content.has_children(node.id)?))
    }

    fn summarize_all(&self, nodes: &[ContentNode]) -> BackofficeResult<Vec<EntitySummary>> {
        nodes.iter().map(|node| self.summarize(node)).collect()
    }

    fn summarize_page(&self, page: Page<ContentNode>) -> BackofficeResult<Page<EntitySummary>> {
        Ok(Page {
            items: self.summarize_all(&page.items)?,
            total: page.total,
        })
    }
}

impl KindStrategy for TreeStrategy {
    fn resolve_by_id(
        &self,
        kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        let object_type = Self::object_type(kind)?;
        self.content
            .get_by_id(id)?
            .filter(|node| node.object_type == object_type)
            .map(|node| self.summarize(&node))
            .transpose()
    }

    fn resolve_by_key(
        &self,
        kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        let object_type = Self::object_type(kind)?;
        self.content
            .get_by_key(key)?
            .filter(|node| node.object_type == object_type)
            .map(|node| self.summarize(&node))
            .transpose()
    }

    fn resolve_by_ids(
        &self,
        kind: EntityKind,
        ids: &[NodeId],
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let nodes = self.content.get_by_ids(Self::object_type(kind)?, ids)?;
        self.summarize_all(&nodes)
    }

    fn resolve_by_keys(
        &self,
        kind: EntityKind,
        keys: &[NodeKey],
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let nodes = self.content.get_by_keys(Self::object_type(kind)?, keys)?;
        self.summarize_all(&nodes)
    }

    fn resolve_all(
        &self,
        kind: EntityKind,
        filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let nodes = self.content.get_all(Self::object_type(kind)?)?;
        Ok(filter.apply(self.summarize_all(&nodes)?))
    }

    fn resolve_children(
        &self,
        kind: EntityKind,
        parent: NodeId,
        scope: &Scope,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let object_type = Self::object_type(kind)?;
        if parent.is_root() && scope.is_restricted() {
            debug!("Listing start nodes {:?} in place of the {} root", scope.start_nodes, kind);
            let nodes = self.content.get_by_ids(object_type, &scope.start_nodes)?;
            let mut by_id: HashMap<NodeId, ContentNode> =
                nodes.into_iter().map(|n| (n.id, n)).collect();
            let ordered: Vec<ContentNode> = scope
                .start_nodes
                .iter()
                .filter_map(|id| by_id.remove(id))
                .collect();
            return self.summarize_all(&ordered);
        }
        let children = self.content.get_children(object_type, parent)?;
        self.summarize_all(&children)
    }

    fn resolve_paged_children(
        &self,
        kind: EntityKind,
        parent: NodeId,
        query: &PageQuery,
        scope: &Scope,
    ) -> BackofficeResult<Page<EntitySummary>> {
        let object_type = Self::object_type(kind)?;
        if parent.is_root() && scope.is_restricted() {
            return Ok(Page {
                items: Vec::new(),
                total: 0,
            });
        }
        let page = self.content.get_paged_children(object_type, parent, query)?;
        self.summarize_page(page)
    }

    fn resolve_paged_descendants(
        &self,
        kind: EntityKind,
        id: NodeId,
        query: &PageQuery,
        scope: &Scope,
    ) -> BackofficeResult<Page<EntitySummary>> {
        let object_type = Self::object_type(kind)?;
        let roots = if !id.is_root() {
            vec![id]
        } else if scope.is_restricted() {
            scope.start_nodes.clone()
        } else {
            vec![NodeId::ROOT]
        };
        let page = self.content.get_paged_descendants(object_type, &roots, query)?;
        self.summarize_page(page)
    }

    fn resolve_ancestors(
        &self,
        kind: EntityKind,
        id: NodeId,
        scope: &Scope,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let object_type = Self::object_type(kind)?;
        let Some(node) = self.content.get_by_id(id)?.filter(|n| n.object_type == object_type) else {
            return Ok(Vec::new());
        };

        let mut chain: Vec<NodeId> = Vec::with_capacity(node.path.ids().len());
        for segment in node.path.ids() {
            if !chain.contains(segment) {
                chain.push(*segment);
            }
        }
        let permitted = scope.permitted_ancestors(&chain);
        if permitted.is_empty() {
            debug!("No start node of the user lies on {}", node.path);
            return Ok(Vec::new());
        }

        let mut ancestors = self.content.get_by_ids(object_type, &permitted)?;
        ancestors.sort_by_key(ContentNode::level);
        self.summarize_all(&ancestors)
    }
}
