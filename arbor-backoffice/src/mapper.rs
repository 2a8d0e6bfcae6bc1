//! Merges editor-submitted field values into a content node.
//!
//! Each submitted field is dispatched to the converter registered for its
//! data type's editor. Problems with a single field never abort the request:
//! missing schema entries are skipped with a warning and converter errors
//! land in the [`ValidationState`].

use crate::error::BackofficeResult;
use crate::uploads::UploadSet;
use crate::validation::ValidationState;
use arbor_model::{
    ContentNode, ContentType, ConversionInput, TagConfiguration, ValueConverterRegistry,
};
use arbor_storage::{CatalogService, SchemaService};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// One submitted field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySubmission {
    pub alias: String,
    #[serde(default)]
    pub value: Value,
}

impl PropertySubmission {
    pub fn new(alias: &str, value: Value) -> Self {
        Self {
            alias: alias.to_string(),
            value,
        }
    }
}

/// The name and field values submitted for one culture (or for invariant
/// content when `culture` is `None`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantSubmission {
    #[serde(default)]
    pub culture: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertySubmission>,
}

impl VariantSubmission {
    pub fn invariant(name: &str) -> Self {
        Self {
            culture: None,
            name: name.to_string(),
            properties: Vec::new(),
        }
    }

    pub fn for_culture(culture: &str, name: &str) -> Self {
        Self {
            culture: Some(culture.to_string()),
            name: name.to_string(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, alias: &str, value: Value) -> Self {
        self.properties.push(PropertySubmission::new(alias, value));
        self
    }
}

/// Maps submitted variants onto a [`ContentNode`].
pub struct PropertyValueMapper {
    schema: Arc<dyn SchemaService>,
    catalog: Arc<dyn CatalogService>,
    converters: Arc<ValueConverterRegistry>,
    default_tag_delimiter: char,
}

impl PropertyValueMapper {
    pub fn new(
        schema: Arc<dyn SchemaService>,
        catalog: Arc<dyn CatalogService>,
        converters: Arc<ValueConverterRegistry>,
        default_tag_delimiter: char,
    ) -> Self {
        Self {
            schema,
            catalog,
            converters,
            default_tag_delimiter,
        }
    }

    /// Maps names and values of every variant. Invariant properties are
    /// taken from the first variant only, so their uploads are processed
    /// once.
    pub fn map_variants(
        &self,
        node: &mut ContentNode,
        content_type: &ContentType,
        variants: &[VariantSubmission],
        uploads: &UploadSet,
        validation: &mut ValidationState,
    ) -> BackofficeResult<()> {
        let default_culture = self.default_culture()?;
        for (index, variant) in variants.iter().enumerate() {
            Self::map_name(node, content_type, variant, default_culture.as_deref());
            self.map_values(node, content_type, variant, index == 0, uploads, validation)?;
        }
        Ok(())
    }

    /// Converts and stores the submitted field values of one variant.
    ///
    /// Invariant properties are only written when `map_invariant` is set.
    pub fn map_values(
        &self,
        node: &mut ContentNode,
        content_type: &ContentType,
        variant: &VariantSubmission,
        map_invariant: bool,
        uploads: &UploadSet,
        validation: &mut ValidationState,
    ) -> BackofficeResult<()> {
        for submitted in &variant.properties {
            let alias = submitted.alias.as_str();
            let Some(property_type) = content_type.property_type(alias) else {
                warn!(
                    "No property type '{}' on content type '{}', skipping",
                    alias, content_type.alias
                );
                continue;
            };
            let Some(data_type) = self.schema.data_type(property_type.data_type_id)? else {
                warn!(
                    "Data type {} of property '{}' no longer exists, skipping",
                    property_type.data_type_id, alias
                );
                continue;
            };
            let Some(converter) = self.converters.get(&data_type.editor_alias) else {
                warn!(
                    "No value converter for editor '{}' (property '{}'), skipping",
                    data_type.editor_alias, alias
                );
                continue;
            };
            if converter.is_read_only() {
                debug!("Property '{}' is read-only, not mapping", alias);
                continue;
            }

            let culture = if property_type.varies_by_culture {
                variant.culture.as_deref()
            } else {
                None
            };
            if culture.is_none() && !map_invariant {
                continue;
            }

            let input = ConversionInput {
                value: submitted.value.clone(),
                configuration: data_type.configuration.clone(),
                content_key: node.key,
                property_type_key: property_type.key,
                files: uploads.matching(alias, culture),
            };
            let previous = node.property(alias).and_then(|p| p.get_value(culture)).cloned();

            let converted = match converter.from_editor(&input, previous.as_ref()) {
                Ok(value) => value,
                Err(message) => {
                    debug!("Converter rejected '{}': {}", alias, message);
                    validation.add_property_error(alias, culture, message);
                    continue;
                }
            };

            let property = node.property_or_insert(alias);
            match converter.tag_support() {
                Some(tags) => {
                    let declared = tags.delimiter.unwrap_or(self.default_tag_delimiter);
                    let config =
                        TagConfiguration::from_data_type_configuration(&data_type.configuration)
                            .with_fallback_delimiter(declared);
                    property.set_tags_value(&converted, &config, culture);
                }
                None => property.set_value(converted, culture),
            }
        }
        Ok(())
    }

    /// Copies a non-empty submitted name onto the node. Blank names never
    /// overwrite what is stored.
    pub fn map_name(
        node: &mut ContentNode,
        content_type: &ContentType,
        variant: &VariantSubmission,
        default_culture: Option<&str>,
    ) {
        let name = variant.name.trim();
        if name.is_empty() {
            return;
        }
        match variant.culture.as_deref() {
            Some(culture) if content_type.varies_by_culture => {
                node.set_name(name, Some(culture));
                if default_culture == Some(culture) || node.name.is_none() {
                    node.set_name(name, None);
                }
            }
            _ => node.set_name(name, None),
        }
    }

    /// Applies a submitted template alias. An empty alias clears the
    /// template and an unknown one is ignored.
    pub fn map_template(&self, node: &mut ContentNode, alias: &str) -> BackofficeResult<()> {
        let alias = alias.trim();
        if alias.is_empty() {
            node.template_id = None;
            return Ok(());
        }
        match self.catalog.template_by_alias(alias)? {
            Some(template) => node.template_id = Some(template.id),
            None => warn!("No template with alias '{}', keeping current template", alias),
        }
        Ok(())
    }

    fn default_culture(&self) -> BackofficeResult<Option<String>> {
        Ok(self
            .catalog
            .languages()?
            .into_iter()
            .find(|l| l.is_default)
            .map(|l| l.iso_code))
    }
}
