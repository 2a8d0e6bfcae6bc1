//! The collaborators every back-office component draws from.

use crate::config::BackofficeConfig;
use crate::preview::{NoPreview, PreviewSession};
use arbor_model::ValueConverterRegistry;
use arbor_storage::{CatalogService, ContentService, PermissionStore, SchemaService};
use std::sync::Arc;

/// Shared handles to the stores, registry and settings.
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct Services {
    pub content: Arc<dyn ContentService>,
    pub schema: Arc<dyn SchemaService>,
    pub catalog: Arc<dyn CatalogService>,
    pub permissions: Arc<dyn PermissionStore>,
    pub converters: Arc<ValueConverterRegistry>,
    pub preview: Arc<dyn PreviewSession>,
    pub config: Arc<BackofficeConfig>,
}

impl Services {
    /// Bundles the stores with the built-in converters, no preview support
    /// and default settings.
    pub fn new(
        content: Arc<dyn ContentService>,
        schema: Arc<dyn SchemaService>,
        catalog: Arc<dyn CatalogService>,
        permissions: Arc<dyn PermissionStore>,
    ) -> Self {
        Self {
            content,
            schema,
            catalog,
            permissions,
            converters: Arc::new(ValueConverterRegistry::with_builtins()),
            preview: Arc::new(NoPreview),
            config: Arc::new(BackofficeConfig::default()),
        }
    }

    #[must_use]
    pub fn with_converters(mut self, converters: Arc<ValueConverterRegistry>) -> Self {
        self.converters = converters;
        self
    }

    #[must_use]
    pub fn with_preview(mut self, preview: Arc<dyn PreviewSession>) -> Self {
        self.preview = preview;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: BackofficeConfig) -> Self {
        self.config = Arc::new(config);
        self
    }
}
