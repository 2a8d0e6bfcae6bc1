//! Notifications attached to a save response.
//!
//! Only message keys travel with a notification. Turning them into text is
//! left to whoever renders the response.

use arbor_storage::PublishStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub header_key: String,
    pub message_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

const PUBLISH_HEADER: &str = "publish";

impl Notification {
    pub fn new(kind: NotificationKind, header_key: &str, message_key: &str) -> Self {
        Self {
            kind,
            header_key: header_key.to_string(),
            message_key: message_key.to_string(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn saved() -> Self {
        Self::new(
            NotificationKind::Success,
            "speechBubbles/editContentSavedHeader",
            "speechBubbles/editContentSavedText",
        )
    }

    pub fn sent_to_publish() -> Self {
        Self::new(
            NotificationKind::Success,
            "speechBubbles/editContentSendToPublish",
            "speechBubbles/editContentSendToPublishText",
        )
    }

    pub fn published() -> Self {
        Self::new(
            NotificationKind::Success,
            "speechBubbles/editContentPublishedHeader",
            "speechBubbles/editContentPublishedText",
        )
    }

    pub fn cancelled() -> Self {
        Self::new(
            NotificationKind::Warning,
            "speechBubbles/operationCancelledHeader",
            "speechBubbles/operationCancelledText",
        )
    }

    /// The draft was stored but validation errors kept it from the
    /// requested action.
    pub fn saved_with_errors() -> Self {
        Self::new(
            NotificationKind::Warning,
            "speechBubbles/validationFailedHeader",
            "speechBubbles/validationFailedMessage",
        )
    }

    pub fn operation_failed(message_key: &str) -> Self {
        Self::new(NotificationKind::Error, "speechBubbles/operationFailedHeader", message_key)
    }

    /// Notification describing a publish outcome. `name` is the node's name
    /// and is passed as the message argument on failures.
    pub fn for_publish_status(status: PublishStatus, name: &str) -> Self {
        let failure = |key: &str| {
            Self::new(NotificationKind::Warning, PUBLISH_HEADER, key).with_arg(format!("'{name}'"))
        };
        match status {
            PublishStatus::Success | PublishStatus::SuccessAlreadyPublished => Self::published(),
            PublishStatus::FailedPathNotPublished => {
                failure("publish/contentPublishedFailedByParent")
            }
            PublishStatus::FailedCancelledByEvent => {
                failure("publish/contentPublishedFailedByEvent")
            }
            PublishStatus::FailedAwaitingRelease => {
                failure("publish/contentPublishedFailedAwaitingRelease")
            }
            PublishStatus::FailedHasExpired => failure("publish/contentPublishedFailedExpired"),
            PublishStatus::FailedIsTrashed => failure("publish/contentPublishedFailedIsTrashed"),
            PublishStatus::FailedContentInvalid => failure("publish/contentPublishedFailedInvalid"),
        }
    }
}
