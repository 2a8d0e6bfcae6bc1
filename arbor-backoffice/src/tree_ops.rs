//! Tree maintenance on behalf of an editor: move, copy, delete, sort,
//! unpublish and publish-by-id.
//!
//! Each operation checks the acting user's permission letter first, then
//! hands off to the [`ContentService`]. Vetoes and refusals come back as a
//! [`TreeOutcome`], never as errors.

use crate::config::BackofficeConfig;
use crate::context::RequestContext;
use crate::error::{BackofficeError, BackofficeResult};
use crate::move_copy::{MoveCopyRejection, MoveCopyValidator, MoveOrCopy};
use crate::permissions::{
    LETTER_COPY, LETTER_DELETE, LETTER_MOVE, LETTER_PUBLISH, LETTER_SORT, LETTER_UNPUBLISH,
    PermissionGate,
};
use crate::services::Services;
use arbor_model::ContentNode;
use arbor_storage::{ContentService, OperationStatus, PublishResult};
use arbor_types::{NodeId, ObjectType};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a tree operation.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeOutcome<T> {
    Completed(T),
    /// The acting user lacks the required permission.
    Forbidden,
    /// The move or copy destination is not allowed.
    Rejected(MoveCopyRejection),
    /// The content service refused or an observer vetoed.
    Failed(OperationStatus),
}

impl<T> TreeOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }
}

pub struct TreeOperations {
    content: Arc<dyn ContentService>,
    gate: PermissionGate,
    validator: MoveCopyValidator,
    config: Arc<BackofficeConfig>,
}

impl TreeOperations {
    pub fn new(services: &Services) -> Self {
        Self {
            content: services.content.clone(),
            gate: PermissionGate::new(
                services.content.clone(),
                services.permissions.clone(),
                services.config.clone(),
            ),
            validator: MoveCopyValidator::new(services.content.clone(), services.schema.clone()),
            config: services.config.clone(),
        }
    }

    fn load(&self, id: NodeId) -> BackofficeResult<ContentNode> {
        self.content
            .get_by_id(id)?
            .ok_or_else(|| BackofficeError::not_found("node", id))
    }

    /// Moves a node and its subtree. Returns the node's new path.
    pub fn move_node(
        &self,
        ctx: &RequestContext,
        request: &MoveOrCopy,
    ) -> BackofficeResult<TreeOutcome<String>> {
        let node = self.load(request.id)?;
        let letters = LETTER_MOVE.to_string();
        if !self.gate.has_access(&ctx.user, request.parent_id, node.object_type, &letters)? {
            return Ok(TreeOutcome::Forbidden);
        }
        let node = match self.validator.validate(request)? {
            Ok(node) => node,
            Err(rejection) => return Ok(TreeOutcome::Rejected(rejection)),
        };

        let status = self.content.move_node(node.id, request.parent_id, ctx.user_id())?;
        if !status.is_success() {
            warn!("Move of node {} under {} failed: {:?}", node.id, request.parent_id, status);
            return Ok(TreeOutcome::Failed(status));
        }
        let moved = self.load(node.id)?;
        info!("User {} moved node {} to {}", ctx.user_id(), node.id, moved.path);
        Ok(TreeOutcome::Completed(moved.path.to_string()))
    }

    /// Copies a node (and, if requested, its subtree). Returns the path of
    /// the copy.
    pub fn copy_node(
        &self,
        ctx: &RequestContext,
        request: &MoveOrCopy,
    ) -> BackofficeResult<TreeOutcome<String>> {
        let node = self.load(request.id)?;
        let letters = LETTER_COPY.to_string();
        if !self.gate.has_access(&ctx.user, request.parent_id, node.object_type, &letters)? {
            return Ok(TreeOutcome::Forbidden);
        }
        let node = match self.validator.validate(request)? {
            Ok(node) => node,
            Err(rejection) => return Ok(TreeOutcome::Rejected(rejection)),
        };

        match self.content.copy(
            node.id,
            request.parent_id,
            request.relate_to_original,
            request.recursive,
            ctx.user_id(),
        )? {
            Some(copy) => Ok(TreeOutcome::Completed(copy.path.to_string())),
            None => {
                warn!("Copy of node {} was cancelled", node.id);
                Ok(TreeOutcome::Failed(OperationStatus::FailedCancelledByEvent))
            }
        }
    }

    /// Trashes a node, or deletes it permanently if it is already in the
    /// recycle bin. Members have no recycle bin and are always deleted.
    pub fn delete_by_id(
        &self,
        ctx: &RequestContext,
        id: NodeId,
    ) -> BackofficeResult<TreeOutcome<OperationStatus>> {
        let node = self.load(id)?;
        let letters = LETTER_DELETE.to_string();
        if !self.gate.has_access_to_path(&ctx.user, &node.path, node.object_type, &letters)? {
            return Ok(TreeOutcome::Forbidden);
        }

        let trashable = self.config.recycle_bin_for(node.object_type.entity_kind()).is_some();
        let status = if node.trashed || !trashable {
            self.content.delete(id, ctx.user_id())?
        } else {
            self.content.move_to_recycle_bin(id, ctx.user_id())?
        };
        Ok(Self::finish(status, "delete", id))
    }

    pub fn empty_recycle_bin(
        &self,
        ctx: &RequestContext,
        object_type: ObjectType,
    ) -> BackofficeResult<TreeOutcome<OperationStatus>> {
        let Some(bin) = self.config.recycle_bin_for(object_type.entity_kind()) else {
            return Err(BackofficeError::NotSupported(format!("{object_type} has no recycle bin")));
        };
        if !self.gate.has_access(&ctx.user, bin, object_type, &LETTER_DELETE.to_string())? {
            return Ok(TreeOutcome::Forbidden);
        }
        let status = self.content.empty_recycle_bin(object_type, ctx.user_id())?;
        Ok(Self::finish(status, "empty recycle bin", bin))
    }

    /// Re-orders the children of `parent` following `ids`. An empty list
    /// is accepted and changes nothing.
    pub fn sort(
        &self,
        ctx: &RequestContext,
        object_type: ObjectType,
        parent: NodeId,
        ids: &[NodeId],
    ) -> BackofficeResult<TreeOutcome<OperationStatus>> {
        if ids.is_empty() {
            return Ok(TreeOutcome::Completed(OperationStatus::NoOperation));
        }
        if !self.gate.has_access(&ctx.user, parent, object_type, &LETTER_SORT.to_string())? {
            return Ok(TreeOutcome::Forbidden);
        }
        let children = self.content.get_by_ids(object_type, ids)?;
        if children.len() != ids.len() || children.iter().any(|c| c.parent_id != parent) {
            warn!("Sort of {} rejected: ids are not all children of it", parent);
            return Ok(TreeOutcome::Failed(OperationStatus::FailedCannot));
        }
        let status = self.content.sort(ids, ctx.user_id())?;
        Ok(Self::finish(status, "sort", parent))
    }

    /// Takes a node offline. Refused for nodes with published children
    /// when `disable_unpublish_when_referenced` is set.
    pub fn unpublish(
        &self,
        ctx: &RequestContext,
        id: NodeId,
    ) -> BackofficeResult<TreeOutcome<OperationStatus>> {
        let node = self.load(id)?;
        let letters = LETTER_UNPUBLISH.to_string();
        if !self.gate.has_access_to_path(&ctx.user, &node.path, node.object_type, &letters)? {
            return Ok(TreeOutcome::Forbidden);
        }
        if self.config.disable_unpublish_when_referenced {
            let children = self.content.get_children(node.object_type, id)?;
            if children.iter().any(|c| c.published) {
                warn!("Node {} has published children, not unpublishing", id);
                return Ok(TreeOutcome::Failed(OperationStatus::FailedCannot));
            }
        }
        let status = self.content.unpublish(id, ctx.user_id())?;
        Ok(Self::finish(status, "unpublish", id))
    }

    /// Publishes the stored draft of a node without binding new values.
    pub fn publish_by_id(
        &self,
        ctx: &RequestContext,
        id: NodeId,
    ) -> BackofficeResult<TreeOutcome<PublishResult>> {
        let mut node = self.load(id)?;
        if !node.object_type.is_publishable() {
            return Err(BackofficeError::NotSupported(format!(
                "publishing is not available for {}",
                node.object_type
            )));
        }
        let letters = LETTER_PUBLISH.to_string();
        if !self.gate.has_access_to_path(&ctx.user, &node.path, node.object_type, &letters)? {
            return Ok(TreeOutcome::Forbidden);
        }
        let result = self.content.save_and_publish(&mut node, ctx.user_id(), ctx.now)?;
        if !result.status.is_success() {
            warn!("Publish of node {} failed: {:?}", id, result.status);
        }
        Ok(TreeOutcome::Completed(result))
    }

    fn finish(
        status: OperationStatus,
        operation: &str,
        id: NodeId,
    ) -> TreeOutcome<OperationStatus> {
        if status.is_success() {
            TreeOutcome::Completed(status)
        } else {
            warn!("{} of {} failed: {:?}", operation, id, status);
            TreeOutcome::Failed(status)
        }
    }
}
