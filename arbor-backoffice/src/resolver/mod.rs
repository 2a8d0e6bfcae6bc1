//! Kind-polymorphic entity lookups for pickers, trees and breadcrumbs.
//!
//! Each [`EntityKind`] is served by a [`KindStrategy`] registered in the
//! resolver's dispatch table. Node-backed kinds share [`TreeStrategy`];
//! schema records and catalog records have their own strategies. Anything
//! a strategy does not override answers [`BackofficeError::NotSupported`].

mod catalog;
mod schema;
mod tree;

pub use catalog::{
    DictionaryStrategy, DomainStrategy, LanguageStrategy, MacroStrategy, MemberGroupStrategy,
    StylesheetStrategy, TemplateStrategy, UserStrategy,
};
pub use schema::{
    ContentTypeStrategy, DataTypeStrategy, PropertyGroupStrategy, PropertyTypeStrategy,
};
pub use tree::TreeStrategy;

use crate::config::BackofficeConfig;
use crate::context::RequestContext;
use crate::error::{BackofficeError, BackofficeResult};
use crate::filter::{CompiledFilter, FilterExpressionCompiler};
use crate::services::Services;
use arbor_model::{EntitySummary, User};
use arbor_storage::{Page, PageQuery, SchemaService};
use arbor_types::{EntityKind, Identifier, NodeId, NodeKey, NodePath, Udi};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Kinds whose listing cannot be post-filtered.
const UNFILTERABLE: [EntityKind; 3] = [
    EntityKind::Stylesheet,
    EntityKind::Language,
    EntityKind::DictionaryItem,
];

/// One page of summaries, numbered from 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_items: usize, page_number: usize, page_size: usize) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_items.div_ceil(page_size)
        };
        Self {
            items,
            total_items,
            page_number,
            page_size,
            total_pages,
        }
    }

    /// The answer for a query with no matches: everything zero.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }
}

/// Paging arguments as the caller sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: i64,
    pub page_size: i64,
    /// Substring match on the entity name.
    pub filter: Option<String>,
    /// Data type of the picker asking, which may lift start-node scoping.
    pub data_type_key: Option<NodeKey>,
}

impl PageRequest {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number,
            page_size,
            filter: None,
            data_type_key: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn with_data_type(mut self, key: NodeKey) -> Self {
        self.data_type_key = Some(key);
        self
    }

    /// Checks both numbers are at least 1 and converts to a zero-based
    /// query, clamping the size to `max_page_size`.
    fn to_query(&self, max_page_size: usize) -> BackofficeResult<(usize, PageQuery)> {
        if self.page_number < 1 || self.page_size < 1 {
            return Err(BackofficeError::InvalidPaging {
                page_number: self.page_number,
                page_size: self.page_size,
            });
        }
        let page_number = usize::try_from(self.page_number).unwrap_or(usize::MAX);
        let page_size = usize::try_from(self.page_size).unwrap_or(usize::MAX).min(max_page_size);
        let query = PageQuery::new(page_number - 1, page_size).with_filter(self.filter.as_deref());
        Ok((page_number, query))
    }
}

/// The part of the tree the acting user may browse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub start_nodes: Vec<NodeId>,
    /// Set when the requesting data type ignores start nodes.
    pub ignore_start_nodes: bool,
}

impl Scope {
    pub fn unrestricted() -> Self {
        Self {
            start_nodes: vec![NodeId::ROOT],
            ignore_start_nodes: false,
        }
    }

    pub fn for_user(user: &User, kind: EntityKind, ignore_start_nodes: bool) -> Self {
        Self {
            start_nodes: user.start_nodes(kind).to_vec(),
            ignore_start_nodes,
        }
    }

    /// Whether browsing is limited to start nodes below the root.
    pub fn is_restricted(&self) -> bool {
        !self.ignore_start_nodes && !self.start_nodes.contains(&NodeId::ROOT)
    }

    /// Cuts a root-first id chain so it begins at the first id the user may
    /// see. Empty when no id in the chain is a start node.
    pub fn permitted_ancestors(&self, chain: &[NodeId]) -> Vec<NodeId> {
        if self.ignore_start_nodes {
            return chain.to_vec();
        }
        match chain.iter().position(|id| self.start_nodes.contains(id)) {
            Some(first) => chain[first..].to_vec(),
            None => Vec::new(),
        }
    }
}

/// Lookups for one family of entity kinds.
///
/// Every method defaults to [`BackofficeError::NotSupported`]; a strategy
/// overrides the ones its kinds can answer.
pub trait KindStrategy: Send + Sync {
    fn resolve_by_id(
        &self,
        kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        let _ = id;
        Err(BackofficeError::not_supported_kind(kind, "lookup by id"))
    }

    fn resolve_by_key(
        &self,
        kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        let _ = key;
        Err(BackofficeError::not_supported_kind(kind, "lookup by key"))
    }

    /// Matches for `ids`, in any order.
    fn resolve_by_ids(
        &self,
        kind: EntityKind,
        ids: &[NodeId],
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(summary) = self.resolve_by_id(kind, *id)? {
                found.push(summary);
            }
        }
        Ok(found)
    }

    /// Matches for `keys`, in any order.
    fn resolve_by_keys(
        &self,
        kind: EntityKind,
        keys: &[NodeKey],
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(summary) = self.resolve_by_key(kind, *key)? {
                found.push(summary);
            }
        }
        Ok(found)
    }

    fn resolve_all(
        &self,
        kind: EntityKind,
        filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let _ = filter;
        Err(BackofficeError::not_supported_kind(kind, "listing"))
    }

    fn resolve_children(
        &self,
        kind: EntityKind,
        parent: NodeId,
        scope: &Scope,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let _ = (parent, scope);
        Err(BackofficeError::not_supported_kind(kind, "children"))
    }

    fn resolve_paged_children(
        &self,
        kind: EntityKind,
        parent: NodeId,
        query: &PageQuery,
        scope: &Scope,
    ) -> BackofficeResult<Page<EntitySummary>> {
        let _ = (parent, query, scope);
        Err(BackofficeError::not_supported_kind(kind, "paged children"))
    }

    fn resolve_paged_descendants(
        &self,
        kind: EntityKind,
        id: NodeId,
        query: &PageQuery,
        scope: &Scope,
    ) -> BackofficeResult<Page<EntitySummary>> {
        let _ = (id, query, scope);
        Err(BackofficeError::not_supported_kind(kind, "paged descendants"))
    }

    /// Ancestors of `id` (itself included), root-most first.
    fn resolve_ancestors(
        &self,
        kind: EntityKind,
        id: NodeId,
        scope: &Scope,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let _ = (id, scope);
        Err(BackofficeError::not_supported_kind(kind, "ancestors"))
    }
}

/// Looks up entities of any kind on behalf of an editor.
pub struct EntityResolver {
    strategies: HashMap<EntityKind, Arc<dyn KindStrategy>>,
    schema: Arc<dyn SchemaService>,
    config: Arc<BackofficeConfig>,
}

impl EntityResolver {
    /// A resolver with the built-in strategy for every kind.
    pub fn new(services: &Services) -> Self {
        let mut resolver = Self {
            strategies: HashMap::new(),
            schema: services.schema.clone(),
            config: services.config.clone(),
        };

        let tree: Arc<dyn KindStrategy> = Arc::new(TreeStrategy::new(services.content.clone()));
        for kind in [EntityKind::Document, EntityKind::Media, EntityKind::Member] {
            resolver.register(kind, tree.clone());
        }
        let schema = &services.schema;
        let content_types: Arc<dyn KindStrategy> =
            Arc::new(ContentTypeStrategy::new(schema.clone()));
        for kind in [EntityKind::DocumentType, EntityKind::MediaType, EntityKind::MemberType] {
            resolver.register(kind, content_types.clone());
        }
        resolver.register(EntityKind::DataType, Arc::new(DataTypeStrategy::new(schema.clone())));
        resolver.register(
            EntityKind::PropertyType,
            Arc::new(PropertyTypeStrategy::new(schema.clone())),
        );
        resolver.register(
            EntityKind::PropertyGroup,
            Arc::new(PropertyGroupStrategy::new(schema.clone())),
        );

        let catalog = &services.catalog;
        resolver.register(EntityKind::Template, Arc::new(TemplateStrategy::new(catalog.clone())));
        resolver.register(EntityKind::Macro, Arc::new(MacroStrategy::new(catalog.clone())));
        resolver.register(EntityKind::User, Arc::new(UserStrategy::new(catalog.clone())));
        resolver.register(
            EntityKind::Stylesheet,
            Arc::new(StylesheetStrategy::new(catalog.clone())),
        );
        resolver.register(EntityKind::Language, Arc::new(LanguageStrategy::new(catalog.clone())));
        resolver.register(
            EntityKind::DictionaryItem,
            Arc::new(DictionaryStrategy::new(catalog.clone())),
        );
        resolver.register(EntityKind::Domain, Arc::new(DomainStrategy::new(catalog.clone())));
        resolver.register(
            EntityKind::MemberGroup,
            Arc::new(MemberGroupStrategy::new(catalog.clone())),
        );
        resolver
    }

    /// Installs or replaces the strategy for `kind`.
    pub fn register(&mut self, kind: EntityKind, strategy: Arc<dyn KindStrategy>) {
        self.strategies.insert(kind, strategy);
    }

    fn strategy(&self, kind: EntityKind) -> BackofficeResult<&Arc<dyn KindStrategy>> {
        self.strategies
            .get(&kind)
            .ok_or_else(|| BackofficeError::not_supported_kind(kind, "resolving"))
    }

    fn ignores_start_nodes(&self, data_type_key: Option<NodeKey>) -> BackofficeResult<bool> {
        let Some(key) = data_type_key else {
            return Ok(false);
        };
        if self.config.ignore_start_nodes_data_types.contains(&key) {
            return Ok(true);
        }
        Ok(self
            .schema
            .data_type_by_key(key)?
            .is_some_and(|dt| dt.ignore_user_start_nodes))
    }

    fn scope(
        &self,
        ctx: &RequestContext,
        kind: EntityKind,
        data_type_key: Option<NodeKey>,
    ) -> BackofficeResult<Scope> {
        Ok(Scope::for_user(&ctx.user, kind, self.ignores_start_nodes(data_type_key)?))
    }

    /// Looks up a single entity by any identifier form. A UDI is resolved
    /// through its key.
    pub fn get_by_id(&self, kind: EntityKind, id: &Identifier) -> BackofficeResult<EntitySummary> {
        let strategy = self.strategy(kind)?;
        let found = match id {
            Identifier::Id(node_id) => strategy.resolve_by_id(kind, *node_id)?,
            Identifier::Key(key) => strategy.resolve_by_key(kind, *key)?,
            Identifier::Udi(udi) => {
                if udi.kind != kind {
                    debug!("UDI {} looked up as {}", udi, kind);
                }
                strategy.resolve_by_key(kind, udi.key)?
            }
        };
        found.ok_or_else(|| BackofficeError::not_found(kind, id))
    }

    /// Summaries for `ids` in the order given. Ids without a match are
    /// left out.
    pub fn get_by_ids(
        &self,
        kind: EntityKind,
        ids: &[NodeId],
    ) -> BackofficeResult<Vec<EntitySummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = self.strategy(kind)?.resolve_by_ids(kind, ids)?;
        let index: HashMap<NodeId, EntitySummary> = found.into_iter().map(|s| (s.id, s)).collect();
        Ok(ids.iter().filter_map(|id| index.get(id).cloned()).collect())
    }

    /// Summaries for `keys` in the order given. Keys without a match are
    /// left out.
    pub fn get_by_keys(
        &self,
        kind: EntityKind,
        keys: &[NodeKey],
    ) -> BackofficeResult<Vec<EntitySummary>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let found = self.strategy(kind)?.resolve_by_keys(kind, keys)?;
        let index: HashMap<NodeKey, EntitySummary> = found
            .into_iter()
            .filter_map(|s| s.key.map(|key| (key, s)))
            .collect();
        Ok(keys.iter().filter_map(|key| index.get(key).cloned()).collect())
    }

    pub fn get_by_udis(
        &self,
        kind: EntityKind,
        udis: &[Udi],
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let keys: Vec<NodeKey> = udis.iter().map(|udi| udi.key).collect();
        self.get_by_keys(kind, &keys)
    }

    /// Children of `parent`. At the root, a user limited to start nodes
    /// gets those start nodes instead.
    pub fn get_children(
        &self,
        ctx: &RequestContext,
        kind: EntityKind,
        parent: NodeId,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let scope = self.scope(ctx, kind, None)?;
        self.strategy(kind)?.resolve_children(kind, parent, &scope)
    }

    /// One page of the children of `parent`.
    pub fn get_paged_children(
        &self,
        ctx: &RequestContext,
        kind: EntityKind,
        parent: NodeId,
        request: &PageRequest,
    ) -> BackofficeResult<PagedResult<EntitySummary>> {
        let (page_number, query) = request.to_query(self.config.max_page_size)?;
        let scope = self.scope(ctx, kind, request.data_type_key)?;
        let page = self
            .strategy(kind)?
            .resolve_paged_children(kind, parent, &query, &scope)?;
        Ok(Self::paged(page, page_number, query.page_size))
    }

    /// One page of the descendants of `id`. Below the root, a user limited
    /// to start nodes sees the descendants of those start nodes.
    pub fn get_paged_descendants(
        &self,
        ctx: &RequestContext,
        kind: EntityKind,
        id: NodeId,
        request: &PageRequest,
    ) -> BackofficeResult<PagedResult<EntitySummary>> {
        let (page_number, query) = request.to_query(self.config.max_page_size)?;
        let scope = self.scope(ctx, kind, request.data_type_key)?;
        let page = self
            .strategy(kind)?
            .resolve_paged_descendants(kind, id, &query, &scope)?;
        Ok(Self::paged(page, page_number, query.page_size))
    }

    fn paged(
        page: Page<EntitySummary>,
        page_number: usize,
        page_size: usize,
    ) -> PagedResult<EntitySummary> {
        if page.total == 0 {
            return PagedResult::empty();
        }
        PagedResult::new(page.items, page.total, page_number, page_size)
    }

    /// The chain from the first ancestor the user may see down to `id`.
    pub fn get_ancestors(
        &self,
        ctx: &RequestContext,
        kind: EntityKind,
        id: NodeId,
        data_type_key: Option<NodeKey>,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let scope = self.scope(ctx, kind, data_type_key)?;
        self.strategy(kind)?.resolve_ancestors(kind, id, &scope)
    }

    /// Every entity of `kind`, narrowed by an optional filter expression.
    pub fn get_all(
        &self,
        kind: EntityKind,
        post_filter: Option<&str>,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        let post_filter = post_filter.map(str::trim).unwrap_or_default();
        if !post_filter.is_empty() && UNFILTERABLE.contains(&kind) {
            return Err(BackofficeError::NotSupported(format!("filtering {kind} is not supported")));
        }
        let filter = FilterExpressionCompiler::compile(post_filter);
        self.strategy(kind)?.resolve_all(kind, &filter)
    }

    /// The id chain from the root to `id`.
    pub fn get_path(&self, kind: EntityKind, id: NodeId) -> BackofficeResult<Vec<NodeId>> {
        let summary = self.get_by_id(kind, &Identifier::Id(id))?;
        Ok(NodePath::parse(&summary.path)?.ids().to_vec())
    }
}
