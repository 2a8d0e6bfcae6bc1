//! Entity kinds addressable through the back office, and the subset that
//! lives in the generic node tree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every kind of record the editorial API can look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Document,
    DocumentType,
    Media,
    MediaType,
    Member,
    MemberType,
    MemberGroup,
    DataType,
    Template,
    Macro,
    PropertyType,
    PropertyGroup,
    User,
    Stylesheet,
    Language,
    DictionaryItem,
    Domain,
}

impl EntityKind {
    /// All kinds, in declaration order.
    pub const ALL: [EntityKind; 17] = [
        Self::Document,
        Self::DocumentType,
        Self::Media,
        Self::MediaType,
        Self::Member,
        Self::MemberType,
        Self::MemberGroup,
        Self::DataType,
        Self::Template,
        Self::Macro,
        Self::PropertyType,
        Self::PropertyGroup,
        Self::User,
        Self::Stylesheet,
        Self::Language,
        Self::DictionaryItem,
        Self::Domain,
    ];

    /// Maps a kind onto the backing-store object type, if it is stored as
    /// a node in the generic tree.
    #[must_use]
    pub const fn object_type(&self) -> Option<ObjectType> {
        match self {
            Self::Document => Some(ObjectType::Document),
            Self::DocumentType => Some(ObjectType::DocumentType),
            Self::Media => Some(ObjectType::Media),
            Self::MediaType => Some(ObjectType::MediaType),
            Self::Member => Some(ObjectType::Member),
            Self::MemberType => Some(ObjectType::MemberType),
            Self::MemberGroup => Some(ObjectType::MemberGroup),
            Self::DataType => Some(ObjectType::DataType),
            _ => None,
        }
    }

    /// Entity-type segment used in UDIs.
    #[must_use]
    pub const fn udi_type(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::DocumentType => "document-type",
            Self::Media => "media",
            Self::MediaType => "media-type",
            Self::Member => "member",
            Self::MemberType => "member-type",
            Self::MemberGroup => "member-group",
            Self::DataType => "data-type",
            Self::Template => "template",
            Self::Macro => "macro",
            Self::PropertyType => "property-type",
            Self::PropertyGroup => "property-group",
            Self::User => "user",
            Self::Stylesheet => "stylesheet",
            Self::Language => "language",
            Self::DictionaryItem => "dictionary-item",
            Self::Domain => "domain",
        }
    }

    #[must_use]
    pub fn from_udi_type(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.udi_type() == s)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.udi_type())
    }
}

/// Object types stored as nodes in the generic tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Document,
    DocumentType,
    Media,
    MediaType,
    Member,
    MemberType,
    MemberGroup,
    DataType,
}

impl ObjectType {
    /// Inverse of [`EntityKind::object_type`].
    #[must_use]
    pub const fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Document => EntityKind::Document,
            Self::DocumentType => EntityKind::DocumentType,
            Self::Media => EntityKind::Media,
            Self::MediaType => EntityKind::MediaType,
            Self::Member => EntityKind::Member,
            Self::MemberType => EntityKind::MemberType,
            Self::MemberGroup => EntityKind::MemberGroup,
            Self::DataType => EntityKind::DataType,
        }
    }

    /// Whether nodes of this type can be published.
    #[must_use]
    pub const fn is_publishable(&self) -> bool {
        matches!(self, Self::Document)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity_kind().udi_type())
    }
}
