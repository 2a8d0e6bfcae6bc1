//! Core type definitions for the Arbor back office.
//!
//! This crate defines the tree- and kind-agnostic vocabulary shared by
//! every other crate:
//! - Node identifiers (integer id, GUID key, compound UDI)
//! - Materialised tree paths
//! - Entity kinds and the node-backed object types
//! - Cancelable pre-operation content events
//!
//! Schema and content types live in `arbor-model`.

mod event;
mod ids;
mod kind;
mod path;

pub use event::{ContentEvent, ContentOperation, EventId, Verdict};
pub use ids::{Identifier, NodeId, NodeKey, Udi, UDI_SCHEME};
pub use kind::{EntityKind, ObjectType};
pub use path::NodePath;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid UDI: {0}")]
    InvalidUdi(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
