//! Identifier types used throughout the back-office core.
//!
//! Every addressable record can be named three ways: by its integer id,
//! by its GUID key, or by a compound [`Udi`] that also carries the entity
//! type. [`Identifier`] is the parsed union of the three.

use crate::kind::EntityKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Integer identifier of a node in one of the content trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(i32);

impl NodeId {
    /// Synthetic root shared by every tree.
    pub const ROOT: NodeId = NodeId(-1);
    /// Recycle bin of the document tree.
    pub const RECYCLE_BIN_CONTENT: NodeId = NodeId(-20);
    /// Recycle bin of the media tree.
    pub const RECYCLE_BIN_MEDIA: NodeId = NodeId(-21);
    /// Placeholder id of a node that has not been persisted yet.
    pub const UNSAVED: NodeId = NodeId(0);

    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns true for the root and recycle-bin sentinels.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self.0, -1 | -20 | -21)
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.0 == -1
    }

    #[must_use]
    pub const fn is_unsaved(&self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for NodeId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| Error::InvalidId(s.to_string()))
    }
}

/// GUID key of a node or record. Stable across environments, unlike [`NodeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(Uuid);

impl NodeKey {
    /// Creates a new random key.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a key from its hyphenated or simple textual form.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for NodeKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Scheme prefix of every UDI.
pub const UDI_SCHEME: &str = "umb://";

/// Compound identifier: `umb://<entity-type>/<guid>`.
///
/// The GUID is rendered without hyphens, lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Udi {
    pub kind: EntityKind,
    pub key: NodeKey,
}

impl Udi {
    #[must_use]
    pub fn new(kind: EntityKind, key: NodeKey) -> Self {
        Self { kind, key }
    }

    /// Parses `umb://document/4fb1...` style identifiers.
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .trim()
            .strip_prefix(UDI_SCHEME)
            .ok_or_else(|| Error::InvalidUdi(s.to_string()))?;
        let (entity_type, guid) = rest
            .split_once('/')
            .ok_or_else(|| Error::InvalidUdi(s.to_string()))?;
        let kind = EntityKind::from_udi_type(entity_type)
            .ok_or_else(|| Error::InvalidUdi(s.to_string()))?;
        let key = Uuid::parse_str(guid).map_err(|_| Error::InvalidUdi(s.to_string()))?;
        Ok(Self {
            kind,
            key: NodeKey::from_uuid(key),
        })
    }
}

impl fmt::Display for Udi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{UDI_SCHEME}{}/{}",
            self.kind.udi_type(),
            self.key.as_uuid().simple()
        )
    }
}

impl FromStr for Udi {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Any of the three identifier forms accepted by lookup operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Identifier {
    Id(NodeId),
    Key(NodeKey),
    Udi(Udi),
}

impl FromStr for Identifier {
    type Err = Error;

    /// Tries integer, then GUID, then UDI.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i32>() {
            return Ok(Self::Id(NodeId(id)));
        }
        if let Ok(key) = Uuid::parse_str(s) {
            return Ok(Self::Key(NodeKey(key)));
        }
        if s.starts_with(UDI_SCHEME) {
            return Ok(Self::Udi(Udi::parse(s)?));
        }
        Err(Error::InvalidId(s.to_string()))
    }
}

impl From<NodeId> for Identifier {
    fn from(id: NodeId) -> Self {
        Self::Id(id)
    }
}

impl From<NodeKey> for Identifier {
    fn from(key: NodeKey) -> Self {
        Self::Key(key)
    }
}

impl From<Udi> for Identifier {
    fn from(udi: Udi) -> Self {
        Self::Udi(udi)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Key(key) => write!(f, "{key}"),
            Self::Udi(udi) => write!(f, "{udi}"),
        }
    }
}
