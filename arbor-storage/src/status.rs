use arbor_model::ContentNode;
use serde::{Deserialize, Serialize};

/// Outcome of a non-publishing content operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Success,
    /// An observer vetoed the operation; nothing was changed.
    FailedCancelledByEvent,
    /// The operation is not possible in the node's current state.
    FailedCannot,
    /// Nothing needed doing.
    NoOperation,
}

impl OperationStatus {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::NoOperation)
    }
}

/// Outcome of a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishStatus {
    Success,
    /// The node was published and unchanged.
    SuccessAlreadyPublished,
    /// An ancestor is not published.
    FailedPathNotPublished,
    FailedCancelledByEvent,
    /// The release date lies in the future.
    FailedAwaitingRelease,
    /// The expiry date has passed.
    FailedHasExpired,
    FailedIsTrashed,
    /// Properties fail validation; see [`PublishResult::invalid_properties`].
    FailedContentInvalid,
}

impl PublishStatus {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::SuccessAlreadyPublished)
    }
}

/// Result of `save_and_publish`, carrying the node as it now stands.
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub status: PublishStatus,
    pub node: ContentNode,
    pub invalid_properties: Vec<String>,
}

impl PublishResult {
    pub fn new(status: PublishStatus, node: ContentNode) -> Self {
        Self {
            status,
            node,
            invalid_properties: Vec::new(),
        }
    }
}
