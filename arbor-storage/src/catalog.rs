//! Lookups for records that do not live in the node tree.

use crate::StorageResult;
use arbor_model::{DictionaryItem, Domain, Language, Macro, MemberGroup, Stylesheet, Template, User};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Read access to templates, users, languages and the other flat records.
pub trait CatalogService: Send + Sync {
    fn templates(&self) -> StorageResult<Vec<Template>>;

    fn template_by_alias(&self, alias: &str) -> StorageResult<Option<Template>> {
        Ok(self.templates()?.into_iter().find(|t| t.alias == alias))
    }

    fn macros(&self) -> StorageResult<Vec<Macro>>;

    fn languages(&self) -> StorageResult<Vec<Language>>;

    fn dictionary_items(&self) -> StorageResult<Vec<DictionaryItem>>;

    fn users(&self) -> StorageResult<Vec<User>>;

    fn user(&self, id: i32) -> StorageResult<Option<User>> {
        Ok(self.users()?.into_iter().find(|u| u.id == id))
    }

    fn stylesheets(&self) -> StorageResult<Vec<Stylesheet>>;

    fn domains(&self) -> StorageResult<Vec<Domain>>;

    fn member_groups(&self) -> StorageResult<Vec<MemberGroup>>;
}

/// Everything a [`MemoryCatalog`] holds. Doubles as the fixture format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub macros: Vec<Macro>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub dictionary_items: Vec<DictionaryItem>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub stylesheets: Vec<Stylesheet>,
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub member_groups: Vec<MemberGroup>,
}

/// In-process [`CatalogService`].
#[derive(Default)]
pub struct MemoryCatalog {
    data: RwLock<CatalogData>,
}

impl MemoryCatalog {
    pub fn new(data: CatalogData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Applies `f` to the catalog under the write lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut CatalogData) -> R) -> StorageResult<R> {
        let mut data = self.data.write()?;
        Ok(f(&mut data))
    }

    fn read<R>(&self, f: impl FnOnce(&CatalogData) -> R) -> StorageResult<R> {
        let data = self.data.read()?;
        Ok(f(&data))
    }
}

impl CatalogService for MemoryCatalog {
    fn templates(&self) -> StorageResult<Vec<Template>> {
        self.read(|d| d.templates.clone())
    }

    fn macros(&self) -> StorageResult<Vec<Macro>> {
        self.read(|d| d.macros.clone())
    }

    fn languages(&self) -> StorageResult<Vec<Language>> {
        self.read(|d| d.languages.clone())
    }

    fn dictionary_items(&self) -> StorageResult<Vec<DictionaryItem>> {
        self.read(|d| d.dictionary_items.clone())
    }

    fn users(&self) -> StorageResult<Vec<User>> {
        self.read(|d| d.users.clone())
    }

    fn stylesheets(&self) -> StorageResult<Vec<Stylesheet>> {
        self.read(|d| d.stylesheets.clone())
    }

    fn domains(&self) -> StorageResult<Vec<Domain>> {
        self.read(|d| d.domains.clone())
    }

    fn member_groups(&self) -> StorageResult<Vec<MemberGroup>> {
        self.read(|d| d.member_groups.clone())
    }
}
