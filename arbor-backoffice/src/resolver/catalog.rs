//! Lookups for records kept outside the node tree.

use super::{KindStrategy, Scope};
use crate::error::BackofficeResult;
use crate::filter::CompiledFilter;
use arbor_model::{DictionaryItem, EntitySummary, Macro, Template, User};
use arbor_storage::CatalogService;
use arbor_types::{EntityKind, NodeId, NodeKey};
use std::sync::Arc;

fn find_id(summaries: Vec<EntitySummary>, id: NodeId) -> Option<EntitySummary> {
    summaries.into_iter().find(|s| s.id == id)
}

fn find_key(summaries: Vec<EntitySummary>, key: NodeKey) -> Option<EntitySummary> {
    summaries.into_iter().find(|s| s.key == Some(key))
}

pub struct TemplateStrategy {
    catalog: Arc<dyn CatalogService>,
}

impl TemplateStrategy {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }

    fn summaries(&self) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(self.catalog.templates()?.iter().map(Template::to_summary).collect())
    }
}

impl KindStrategy for TemplateStrategy {
    fn resolve_by_id(
        &self,
        _kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(find_id(self.summaries()?, id))
    }

    fn resolve_by_key(
        &self,
        _kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(find_key(self.summaries()?, key))
    }

    fn resolve_all(
        &self,
        _kind: EntityKind,
        filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(filter
            .apply(self.catalog.templates()?)
            .iter()
            .map(Template::to_summary)
            .collect())
    }
}

/// Macros, listed by name.
pub struct MacroStrategy {
    catalog: Arc<dyn CatalogService>,
}

impl MacroStrategy {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }

    fn macros(&self) -> BackofficeResult<Vec<Macro>> {
        let mut macros = self.catalog.macros()?;
        macros.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(macros)
    }
}

impl KindStrategy for MacroStrategy {
    fn resolve_by_id(
        &self,
        _kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self
            .macros()?
            .iter()
            .find(|m| m.id == id.as_i32())
            .map(Macro::to_summary))
    }

    fn resolve_by_key(
        &self,
        _kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self.macros()?.iter().find(|m| m.key == key).map(Macro::to_summary))
    }

    fn resolve_all(
        &self,
        _kind: EntityKind,
        filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(filter.apply(self.macros()?).iter().map(Macro::to_summary).collect())
    }
}

pub struct UserStrategy {
    catalog: Arc<dyn CatalogService>,
}

impl UserStrategy {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }
}

impl KindStrategy for UserStrategy {
    fn resolve_by_id(
        &self,
        _kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self.catalog.user(id.as_i32())?.as_ref().map(User::to_summary))
    }

    fn resolve_by_key(
        &self,
        _kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self
            .catalog
            .users()?
            .iter()
            .find(|u| u.key == key)
            .map(User::to_summary))
    }

    fn resolve_all(
        &self,
        _kind: EntityKind,
        filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(filter.apply(self.catalog.users()?).iter().map(User::to_summary).collect())
    }
}

/// Stylesheets have no ids; they can only be listed.
pub struct StylesheetStrategy {
    catalog: Arc<dyn CatalogService>,
}

impl StylesheetStrategy {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }
}

impl KindStrategy for StylesheetStrategy {
    fn resolve_all(
        &self,
        _kind: EntityKind,
        _filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(self.catalog.stylesheets()?.iter().map(|s| s.to_summary()).collect())
    }
}

pub struct LanguageStrategy {
    catalog: Arc<dyn CatalogService>,
}

impl LanguageStrategy {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }
}

impl KindStrategy for LanguageStrategy {
    fn resolve_by_id(
        &self,
        _kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self
            .catalog
            .languages()?
            .iter()
            .find(|l| l.id == id.as_i32())
            .map(|l| l.to_summary()))
    }

    fn resolve_all(
        &self,
        _kind: EntityKind,
        _filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(self.catalog.languages()?.iter().map(|l| l.to_summary()).collect())
    }
}

/// Dictionary items, walked as a tree: each item is followed by its
/// children, siblings ordered by item key.
pub struct DictionaryStrategy {
    catalog: Arc<dyn CatalogService>,
}

impl DictionaryStrategy {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }

    fn children_of<'a>(
        items: &'a [DictionaryItem],
        parent: Option<NodeKey>,
    ) -> Vec<&'a DictionaryItem> {
        let mut children: Vec<&DictionaryItem> =
            items.iter().filter(|i| i.parent_key == parent).collect();
        children.sort_by(|a, b| a.item_key.cmp(&b.item_key));
        children
    }

    fn walk(
        items: &[DictionaryItem],
        parent: Option<NodeKey>,
        level: usize,
        out: &mut Vec<EntitySummary>,
    ) {
        for item in Self::children_of(items, parent) {
            let mut summary = item.to_summary(level);
            if let Some(parent_item) = parent.and_then(|key| items.iter().find(|i| i.key == key)) {
                summary.parent_id = NodeId::new(parent_item.id);
            }
            out.push(summary);
            Self::walk(items, Some(item.key), level + 1, out);
        }
    }

    fn hierarchy(&self) -> BackofficeResult<Vec<EntitySummary>> {
        let items = self.catalog.dictionary_items()?;
        let mut out = Vec::with_capacity(items.len());
        Self::walk(&items, None, 1, &mut out);
        Ok(out)
    }
}

impl KindStrategy for DictionaryStrategy {
    fn resolve_by_id(
        &self,
        _kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(find_id(self.hierarchy()?, id))
    }

    fn resolve_by_key(
        &self,
        _kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(find_key(self.hierarchy()?, key))
    }

    fn resolve_all(
        &self,
        _kind: EntityKind,
        _filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        self.hierarchy()
    }

    fn resolve_children(
        &self,
        _kind: EntityKind,
        parent: NodeId,
        _scope: &Scope,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(self
            .hierarchy()?
            .into_iter()
            .filter(|s| s.parent_id == parent)
            .collect())
    }
}

/// Hostnames bound to content roots. Looked up by id only.
pub struct DomainStrategy {
    catalog: Arc<dyn CatalogService>,
}

impl DomainStrategy {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }
}

impl KindStrategy for DomainStrategy {
    fn resolve_by_id(
        &self,
        _kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(self
            .catalog
            .domains()?
            .iter()
            .find(|d| d.id == id.as_i32())
            .map(|d| d.to_summary()))
    }
}

pub struct MemberGroupStrategy {
    catalog: Arc<dyn CatalogService>,
}

impl MemberGroupStrategy {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }

    fn summaries(&self) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(self.catalog.member_groups()?.iter().map(|g| g.to_summary()).collect())
    }
}

impl KindStrategy for MemberGroupStrategy {
    fn resolve_by_id(
        &self,
        _kind: EntityKind,
        id: NodeId,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(find_id(self.summaries()?, id))
    }

    fn resolve_by_key(
        &self,
        _kind: EntityKind,
        key: NodeKey,
    ) -> BackofficeResult<Option<EntitySummary>> {
        Ok(find_key(self.summaries()?, key))
    }

    fn resolve_all(
        &self,
        _kind: EntityKind,
        filter: &CompiledFilter,
    ) -> BackofficeResult<Vec<EntitySummary>> {
        Ok(filter.apply(self.summaries()?))
    }
}
