//! Content model for the Arbor back office.
//!
//! Defines the data every editorial operation works on:
//! - [`ContentNode`] and its [`Property`] values
//! - The user-defined schema: [`ContentType`], [`PropertyType`], [`DataType`]
//! - [`ValueConverter`] and its registry, which turn editor input into stored values
//! - Catalog records that live outside the node tree ([`Template`], [`User`], …)
//! - [`FieldAccess`], the named-field reflection used by runtime filters

mod catalog;
pub mod converter;
mod entity;
mod fields;
mod property;
mod schema;
mod validation;

pub use catalog::{DictionaryItem, Domain, Language, Macro, MemberGroup, Stylesheet, Template, User};
pub use converter::{
    ConversionFile, ConversionInput, TagSupport, ValueConverter, ValueConverterRegistry,
};
pub use entity::{ContentNode, EntitySummary};
pub use fields::{FieldAccess, FieldKind, FieldValue};
pub use property::{DEFAULT_TAG_DELIMITER, Property, TagConfiguration, TagStorage};
pub use schema::{ContentType, DataType, PropertyGroup, PropertyType};
pub use validation::{PropertyViolation, invalid_property_aliases, validate_properties};

/// Errors raised while manipulating model objects.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("property '{0}' is not defined on the content type")]
    UnknownProperty(String),

    #[error("content type '{0}' not found")]
    UnknownContentType(String),

    #[error("property '{0}' is read-only")]
    ReadOnlyProperty(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
