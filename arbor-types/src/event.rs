//! Pre-operation content events.
//!
//! Every persistence or publish step raises one of these before any
//! irreversible work happens. Observers answer with a [`Verdict`]; a single
//! [`Verdict::Deny`] cancels the operation.

use crate::{NodeId, ObjectType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new event ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The operation about to be performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum ContentOperation {
    /// A node is about to be saved (created when `is_new`).
    Saving { is_new: bool },

    /// A node is about to be published.
    Publishing,

    /// A node is about to be unpublished.
    Unpublishing,

    /// A node is about to be submitted for approval.
    SendingToPublish,

    /// A node (and its subtree) is about to be moved under `new_parent`.
    Moving { new_parent: NodeId },

    /// A node is about to be copied under `new_parent`.
    Copying { new_parent: NodeId, recursive: bool },

    /// A node (and its subtree) is about to be moved into the recycle bin.
    Trashing,

    /// A node (and its subtree) is about to be deleted permanently.
    Deleting,

    /// Children of `parent` are about to be re-ordered.
    Sorting { parent: NodeId },

    /// The recycle bin is about to be emptied.
    EmptyingRecycleBin,
}

impl ContentOperation {
    /// Short name used in log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Saving { .. } => "saving",
            Self::Publishing => "publishing",
            Self::Unpublishing => "unpublishing",
            Self::SendingToPublish => "sending-to-publish",
            Self::Moving { .. } => "moving",
            Self::Copying { .. } => "copying",
            Self::Trashing => "trashing",
            Self::Deleting => "deleting",
            Self::Sorting { .. } => "sorting",
            Self::EmptyingRecycleBin => "emptying-recycle-bin",
        }
    }
}

/// A cancelable pre-operation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEvent {
    pub id: EventId,

    /// Target node. For recycle-bin emptying this is the bin id.
    pub node_id: NodeId,

    pub object_type: ObjectType,

    /// Acting user id.
    pub user_id: i32,

    pub operation: ContentOperation,
}

impl ContentEvent {
    #[must_use]
    pub fn new(
        node_id: NodeId,
        object_type: ObjectType,
        user_id: i32,
        operation: ContentOperation,
    ) -> Self {
        Self {
            id: EventId::new(),
            node_id,
            object_type,
            user_id,
            operation,
        }
    }
}

/// An observer's answer to a [`ContentEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Allow,
    Deny { reason: String },
}

impl Verdict {
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}
