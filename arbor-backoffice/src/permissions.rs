//! Path- and letter-based access checks.
//!
//! A user may touch a node when one of their start nodes lies on the node's
//! path and, for documents, every required permission letter is assigned.
//! Letters are never fetched for a node outside the user's start nodes.

use crate::config::BackofficeConfig;
use crate::error::{BackofficeError, BackofficeResult};
use arbor_model::User;
use arbor_storage::{ContentService, PermissionStore};
use arbor_types::{NodeId, NodePath, ObjectType};
use std::sync::Arc;
use tracing::debug;

pub const LETTER_UPDATE: char = 'A';
pub const LETTER_CREATE: char = 'C';
pub const LETTER_PUBLISH: char = 'U';
pub const LETTER_SEND_TO_PUBLISH: char = 'H';
pub const LETTER_MOVE: char = 'M';
pub const LETTER_COPY: char = 'O';
pub const LETTER_SORT: char = 'S';
pub const LETTER_DELETE: char = 'D';
pub const LETTER_UNPUBLISH: char = 'Z';

/// Whether a node at `path` lies under one of `start_nodes`.
///
/// Users whose start nodes include the root see everything. Anyone else
/// is kept out of the recycle bin, whose contents no longer sit under
/// their start nodes.
pub fn has_path_access(path: &NodePath, start_nodes: &[NodeId], recycle_bin_id: NodeId) -> bool {
    if start_nodes.contains(&NodeId::ROOT) {
        return true;
    }
    if path.contains(recycle_bin_id) {
        return false;
    }
    start_nodes.iter().any(|id| path.contains(*id))
}

/// Answers "may this user do X to that node".
pub struct PermissionGate {
    content: Arc<dyn ContentService>,
    permissions: Arc<dyn PermissionStore>,
    config: Arc<BackofficeConfig>,
}

impl PermissionGate {
    pub fn new(
        content: Arc<dyn ContentService>,
        permissions: Arc<dyn PermissionStore>,
        config: Arc<BackofficeConfig>,
    ) -> Self {
        Self {
            content,
            permissions,
            config,
        }
    }

    /// Checks path access to `node_id` and, when `required` is non-empty,
    /// that every letter in it is assigned.
    ///
    /// The root and the recycle bin have no stored node; both are reachable
    /// only by users whose start nodes include the root. A missing node is
    /// a [`BackofficeError::NotFound`].
    pub fn has_access(
        &self,
        user: &User,
        node_id: NodeId,
        object_type: ObjectType,
        required: &str,
    ) -> BackofficeResult<bool> {
        let kind = object_type.entity_kind();
        let bin = self.config.recycle_bin_for(kind);
        let path = if node_id.is_root() {
            NodePath::root()
        } else if Some(node_id) == bin {
            NodePath::root().child(node_id)
        } else {
            self.content
                .get_by_id(node_id)?
                .ok_or_else(|| BackofficeError::not_found(kind, node_id))?
                .path
        };
        self.has_access_to_path(user, &path, object_type, required)
    }

    /// Same as [`has_access`](Self::has_access) for a path already at hand.
    pub fn has_access_to_path(
        &self,
        user: &User,
        path: &NodePath,
        object_type: ObjectType,
        required: &str,
    ) -> BackofficeResult<bool> {
        let kind = object_type.entity_kind();
        let bin = self.config.recycle_bin_for(kind).unwrap_or(NodeId::RECYCLE_BIN_CONTENT);
        if !has_path_access(path, user.start_nodes(kind), bin) {
            debug!("User {} has no path access to {}", user.id, path);
            return Ok(false);
        }
        if required.is_empty() || object_type != ObjectType::Document {
            return Ok(true);
        }

        let Some(assigned) = self.permissions.get_permissions_for_path(user.id, path)? else {
            debug!("User {} has no permissions recorded for {}", user.id, path);
            return Ok(false);
        };
        let granted = required.chars().all(|letter| assigned.contains(letter));
        if !granted {
            debug!(
                "User {} lacks '{}' on {} (has '{}')",
                user.id, required, path, assigned
            );
        }
        Ok(granted)
    }
}
