//! Validation of move and copy targets.

use crate::error::{BackofficeError, BackofficeResult};
use arbor_model::ContentNode;
use arbor_storage::{ContentService, SchemaService};
use arbor_types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A request to move or copy `id` beneath `parent_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOrCopy {
    pub id: NodeId,
    pub parent_id: NodeId,
    /// Copy only: record the original on the copy.
    #[serde(default)]
    pub relate_to_original: bool,
    /// Copy only: copy the whole subtree.
    #[serde(default)]
    pub recursive: bool,
}

impl MoveOrCopy {
    pub fn new(id: NodeId, parent_id: NodeId) -> Self {
        Self {
            id,
            parent_id,
            relate_to_original: false,
            recursive: false,
        }
    }

    #[must_use]
    pub fn relate_to_original(mut self) -> Self {
        self.relate_to_original = true;
        self
    }

    #[must_use]
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }
}

/// Why a move or copy target was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveCopyRejection {
    /// The node's content type may not sit at the root.
    NotAllowedAtRoot,
    /// The parent's content type does not allow the node's type as a child.
    NotAllowedByContentType,
    /// The destination is the node itself or one of its descendants.
    NotAllowedByPath,
}

impl MoveCopyRejection {
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::NotAllowedAtRoot => "moveOrCopy/notAllowedAtRoot",
            Self::NotAllowedByContentType => "moveOrCopy/notAllowedByContentType",
            Self::NotAllowedByPath => "moveOrCopy/notAllowedByPath",
        }
    }
}

impl fmt::Display for MoveCopyRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message_key())
    }
}

pub struct MoveCopyValidator {
    content: Arc<dyn ContentService>,
    schema: Arc<dyn SchemaService>,
}

impl MoveCopyValidator {
    pub fn new(content: Arc<dyn ContentService>, schema: Arc<dyn SchemaService>) -> Self {
        Self { content, schema }
    }

    /// Returns the node to move or copy, or the reason the destination is
    /// refused. A missing node or parent is an error.
    ///
    /// Any negative destination id counts as the root.
    pub fn validate(
        &self,
        request: &MoveOrCopy,
    ) -> BackofficeResult<Result<ContentNode, MoveCopyRejection>> {
        let node = self
            .content
            .get_by_id(request.id)?
            .ok_or_else(|| BackofficeError::not_found("node", request.id))?;
        let content_type = self
            .schema
            .content_type(node.content_type_id)?
            .ok_or_else(|| BackofficeError::not_found("content type", node.content_type_id))?;

        if request.parent_id.as_i32() < 0 {
            if !content_type.allowed_as_root {
                debug!("{} may not be placed at the root", content_type.alias);
                return Ok(Err(MoveCopyRejection::NotAllowedAtRoot));
            }
            return Ok(Ok(node));
        }

        let parent = self
            .content
            .get_by_id(request.parent_id)?
            .ok_or_else(|| BackofficeError::not_found("parent", request.parent_id))?;
        let parent_type = self
            .schema
            .content_type(parent.content_type_id)?
            .ok_or_else(|| BackofficeError::not_found("content type", parent.content_type_id))?;
        if !parent_type.allows_child(content_type.id) {
            debug!("{} does not allow {} below it", parent_type.alias, content_type.alias);
            return Ok(Err(MoveCopyRejection::NotAllowedByContentType));
        }

        if parent.path.contains(node.id) {
            debug!("{} lies within the subtree of {}", parent.path, node.id);
            return Ok(Err(MoveCopyRejection::NotAllowedByPath));
        }

        Ok(Ok(node))
    }
}
