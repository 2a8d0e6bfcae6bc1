//! Storage layer for the Arbor back office.
//!
//! Defines the collaborator interfaces the editorial core consumes and
//! ships in-process implementations of each:
//!
//! - [`ContentService`] / [`MemoryContentService`]: node persistence, tree
//!   moves, recycle bin and publishing
//! - [`SchemaService`] / [`MemorySchemaService`]: content types and data types
//! - [`CatalogService`] / [`MemoryCatalog`]: templates, users, languages and
//!   other records outside the tree
//! - [`PermissionStore`] / [`SqlitePermissionStore`]: permission letters
//!   per user and node, persisted in SQLite
//! - [`NotificationBus`]: cancelable pre-operation events

mod catalog;
mod content;
mod error;
mod notifications;
mod permissions;
mod schema;
mod status;

pub use catalog::{CatalogData, CatalogService, MemoryCatalog};
pub use content::{ContentService, MemoryContentService, Page, PageQuery};
pub use error::{StorageError, StorageResult};
pub use notifications::{ContentObserver, NotificationBus};
pub use permissions::{PermissionStore, SqlitePermissionStore};
pub use schema::{MemorySchemaService, SchemaService, SchemaSnapshot};
pub use status::{OperationStatus, PublishResult, PublishStatus};
