//! The save / publish workflow.
//!
//! A save request is authorised, mapped onto the persisted node (or a fresh
//! scaffold), validated and then dispatched according to its intent:
//!
//! 1. **Authorise**: `A` on existing nodes, `C` on the parent of new ones,
//!    plus `U` for publishing and `H` for sending to publish
//! 2. **Bind**: names, template and field values via [`PropertyValueMapper`]
//! 3. **Validate**: name presence plus mandatory and pattern rules
//! 4. **Dispatch**: save, send to publish, or save-and-publish
//!
//! Invalid content is still saved so editors never lose work. A publish
//! intent is downgraded to a plain save when validation fails, while a
//! send-to-publish intent is kept as is. A new node without a name cannot
//! be stored at all and is rejected.
//!
//! Uploaded temporary files are removed when the request finishes, whatever
//! the outcome.

use crate::context::RequestContext;
use crate::error::{BackofficeError, BackofficeResult};
use crate::mapper::{PropertyValueMapper, VariantSubmission};
use crate::notifications::Notification;
use crate::permissions::{
    LETTER_CREATE, LETTER_PUBLISH, LETTER_SEND_TO_PUBLISH, LETTER_UPDATE, PermissionGate,
};
use crate::preview::PreviewSession;
use crate::services::Services;
use crate::uploads::UploadSet;
use crate::validation::{ErrorModel, PERMISSION_KEY, ValidationState};
use arbor_model::{ContentNode, ContentType, validate_properties};
use arbor_storage::{ContentService, OperationStatus, PublishStatus, SchemaService};
use arbor_types::{NodeId, NodePath, ObjectType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the editor asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaveIntent {
    Save,
    SaveNew,
    Publish,
    PublishNew,
    SendToPublish,
    SendToPublishNew,
}

impl SaveIntent {
    /// Whether the intent creates a node.
    pub fn is_new(&self) -> bool {
        matches!(self, Self::SaveNew | Self::PublishNew | Self::SendToPublishNew)
    }

    pub fn is_publish(&self) -> bool {
        matches!(self, Self::Publish | Self::PublishNew)
    }

    pub fn is_send_to_publish(&self) -> bool {
        matches!(self, Self::SendToPublish | Self::SendToPublishNew)
    }

    /// The intent to use when validation failed. Publishing falls back to
    /// saving; everything else is unchanged.
    #[must_use]
    pub fn downgraded(&self) -> Self {
        match self {
            Self::Publish => Self::Save,
            Self::PublishNew => Self::SaveNew,
            other => *other,
        }
    }

    /// Permission letters the acting user needs.
    pub fn required_letters(&self) -> String {
        let mut letters = String::new();
        letters.push(if self.is_new() { LETTER_CREATE } else { LETTER_UPDATE });
        if self.is_publish() {
            letters.push(LETTER_PUBLISH);
        }
        if self.is_send_to_publish() {
            letters.push(LETTER_SEND_TO_PUBLISH);
        }
        letters
    }
}

/// A submitted content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItemSave {
    /// Target node. Ignored for creating intents.
    #[serde(default = "unsaved")]
    pub id: NodeId,
    /// Parent of a node being created.
    #[serde(default = "root")]
    pub parent_id: NodeId,
    /// Content type of a node being created.
    #[serde(default)]
    pub content_type_alias: String,
    pub intent: SaveIntent,
    #[serde(default)]
    pub variants: Vec<VariantSubmission>,
    /// `Some("")` clears the template, `None` leaves it alone.
    #[serde(default)]
    pub template_alias: Option<String>,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expire_date: Option<DateTime<Utc>>,
}

fn unsaved() -> NodeId {
    NodeId::UNSAVED
}

fn root() -> NodeId {
    NodeId::ROOT
}

impl ContentItemSave {
    /// A request creating a node of `content_type_alias` under `parent_id`.
    pub fn create(parent_id: NodeId, content_type_alias: &str, intent: SaveIntent) -> Self {
        Self {
            id: NodeId::UNSAVED,
            parent_id,
            content_type_alias: content_type_alias.to_string(),
            intent,
            variants: Vec::new(),
            template_alias: None,
            release_date: None,
            expire_date: None,
        }
    }

    /// A request updating node `id`.
    pub fn update(id: NodeId, intent: SaveIntent) -> Self {
        Self {
            id,
            ..Self::create(NodeId::ROOT, "", intent)
        }
    }

    #[must_use]
    pub fn with_variant(mut self, variant: VariantSubmission) -> Self {
        self.variants.push(variant);
        self
    }

    #[must_use]
    pub fn with_template(mut self, alias: &str) -> Self {
        self.template_alias = Some(alias.to_string());
        self
    }

    #[must_use]
    pub fn with_schedule(
        mut self,
        release_date: Option<DateTime<Utc>>,
        expire_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.release_date = release_date;
        self.expire_date = expire_date;
        self
    }
}

/// How a save request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SaveOutcome {
    /// The user may not perform the requested action. Nothing was stored.
    Forbidden,
    /// A new node lacked data required to store it. Nothing was stored.
    Rejected,
    /// Creating the node was vetoed; there is no id to return to.
    CancelledNew,
    Saved { status: OperationStatus },
    SentToPublish { sent: bool },
    Published {
        status: PublishStatus,
        invalid_properties: Vec<String>,
    },
}

impl SaveOutcome {
    /// Outcomes the caller should report as a client error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Forbidden | Self::Rejected | Self::CancelledNew)
    }

    /// Whether an observer vetoed the operation.
    pub fn was_cancelled(&self) -> bool {
        match self {
            Self::CancelledNew => true,
            Self::Saved { status } => *status == OperationStatus::FailedCancelledByEvent,
            Self::SentToPublish { sent } => !sent,
            Self::Published { status, .. } => *status == PublishStatus::FailedCancelledByEvent,
            Self::Forbidden | Self::Rejected => false,
        }
    }

    /// Whether the draft reached storage.
    pub fn persisted(&self) -> bool {
        match self {
            Self::Saved { status } => status.is_success(),
            Self::SentToPublish { sent } => *sent,
            Self::Published { status, .. } => *status != PublishStatus::FailedCancelledByEvent,
            Self::Forbidden | Self::Rejected | Self::CancelledNew => false,
        }
    }
}

/// Everything returned for a save request.
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    /// The intent actually executed, after any downgrade.
    pub intent: SaveIntent,
    pub outcome: SaveOutcome,
    /// The node as stored, or as submitted when nothing was stored.
    pub node: ContentNode,
    pub validation: Option<ErrorModel>,
    pub notifications: Vec<Notification>,
}

impl SaveResponse {
    pub fn is_valid(&self) -> bool {
        self.validation.is_none()
    }
}

/// Runs save requests against the configured services.
pub struct SaveWorkflow {
    content: Arc<dyn ContentService>,
    schema: Arc<dyn SchemaService>,
    mapper: PropertyValueMapper,
    gate: PermissionGate,
    preview: Arc<dyn PreviewSession>,
    upload_dir: PathBuf,
}

impl SaveWorkflow {
    pub fn new(services: &Services) -> Self {
        Self {
            content: services.content.clone(),
            schema: services.schema.clone(),
            mapper: PropertyValueMapper::new(
                services.schema.clone(),
                services.catalog.clone(),
                services.converters.clone(),
                services.config.default_tag_delimiter,
            ),
            gate: PermissionGate::new(
                services.content.clone(),
                services.permissions.clone(),
                services.config.clone(),
            ),
            preview: services.preview.clone(),
            upload_dir: services.config.upload_temp_dir.clone(),
        }
    }

    /// An empty upload set staging under the configured temp directory.
    pub fn uploads(&self) -> UploadSet {
        UploadSet::in_dir(&self.upload_dir)
    }

    /// Executes one save request. The upload set is consumed and its files
    /// are gone when this returns, on success and on error alike.
    pub fn execute(
        &self,
        ctx: &RequestContext,
        item: ContentItemSave,
        mut uploads: UploadSet,
    ) -> BackofficeResult<SaveResponse> {
        let result = self.run(ctx, &item, &uploads);
        let removed = uploads.cleanup();
        if removed > 0 {
            debug!("Removed {} temporary upload(s)", removed);
        }
        result
    }

    fn run(
        &self,
        ctx: &RequestContext,
        item: &ContentItemSave,
        uploads: &UploadSet,
    ) -> BackofficeResult<SaveResponse> {
        let intent = item.intent;
        let (mut node, content_type) = self.resolve(ctx, item)?;

        let publishing = intent.is_publish() || intent.is_send_to_publish();
        if publishing && !node.object_type.is_publishable() {
            return Err(BackofficeError::NotSupported(format!(
                "{intent:?} is not available for {}",
                node.object_type
            )));
        }

        let fallback = [VariantSubmission::default()];
        let variants = if item.variants.is_empty() {
            &fallback[..]
        } else {
            &item.variants[..]
        };

        let mut validation = ValidationState::new();
        if !self.authorize(ctx, item, &node)? {
            warn!(
                "User {} may not {:?} node {} ({})",
                ctx.user_id(),
                intent,
                node.id,
                intent.required_letters()
            );
            let mut discarded = ValidationState::new();
            self.bind(&mut node, &content_type, item, variants, uploads, &mut discarded)?;
            validation.add_error(
                PERMISSION_KEY,
                format!("Missing permission {}", intent.required_letters()),
            );
            return Ok(SaveResponse {
                intent,
                outcome: SaveOutcome::Forbidden,
                node,
                validation: Some(validation.to_error_model("Access denied")),
                notifications: Vec::new(),
            });
        }

        self.bind(&mut node, &content_type, item, variants, uploads, &mut validation)?;
        Self::validate(&node, &content_type, variants, &mut validation);

        if node.is_new() && !node.has_name() {
            info!("Rejected creation of {} under {}: no name", content_type.alias, node.parent_id);
            return Ok(SaveResponse {
                intent,
                outcome: SaveOutcome::Rejected,
                node,
                validation: Some(validation.to_error_model("The item could not be created")),
                notifications: vec![Notification::operation_failed(
                    "speechBubbles/validationFailedMessage",
                )],
            });
        }

        let effective = if validation.is_valid() {
            intent
        } else {
            intent.downgraded()
        };
        if effective != intent {
            debug!("Downgraded {:?} to {:?} after validation errors", intent, effective);
        }

        let was_new = node.is_new();
        let mut notifications = Vec::new();
        let mut outcome =
            self.dispatch(ctx, effective, &mut node, &mut validation, &mut notifications)?;

        if outcome.was_cancelled() {
            warn!("{:?} of node {} was cancelled by an observer", effective, node.id);
            notifications.push(Notification::cancelled());
            if effective.is_new() {
                outcome = SaveOutcome::CancelledNew;
            }
        }

        if !was_new && outcome.persisted() {
            if let Some(token) = &ctx.preview {
                self.preview.refresh(token, node.id)?;
            }
        }

        let validation = (!validation.is_valid())
            .then(|| validation.to_error_model("The item was saved with validation errors"));
        Ok(SaveResponse {
            intent: effective,
            outcome,
            node,
            validation,
            notifications,
        })
    }

    fn resolve(
        &self,
        ctx: &RequestContext,
        item: &ContentItemSave,
    ) -> BackofficeResult<(ContentNode, ContentType)> {
        if item.intent.is_new() {
            let alias = &item.content_type_alias;
            let content_type = self
                .schema
                .content_type_by_alias(alias)?
                .ok_or_else(|| BackofficeError::not_found("content type", alias))?;
            let parent_path = if item.parent_id.is_root() {
                NodePath::root()
            } else {
                self.content
                    .get_by_id(item.parent_id)?
                    .ok_or_else(|| BackofficeError::not_found("parent", item.parent_id))?
                    .path
            };
            let node = ContentNode::scaffold(&content_type, &parent_path, ctx.user_id());
            return Ok((node, content_type));
        }

        let node = self
            .content
            .get_by_id(item.id)?
            .ok_or_else(|| BackofficeError::not_found("node", item.id))?;
        let content_type = self
            .schema
            .content_type(node.content_type_id)?
            .ok_or_else(|| BackofficeError::not_found("content type", node.content_type_id))?;
        Ok((node, content_type))
    }

    fn authorize(
        &self,
        ctx: &RequestContext,
        item: &ContentItemSave,
        node: &ContentNode,
    ) -> BackofficeResult<bool> {
        let letters = item.intent.required_letters();
        if node.is_new() {
            self.gate.has_access(&ctx.user, node.parent_id, node.object_type, &letters)
        } else {
            self.gate.has_access_to_path(&ctx.user, &node.path, node.object_type, &letters)
        }
    }

    fn bind(
        &self,
        node: &mut ContentNode,
        content_type: &ContentType,
        item: &ContentItemSave,
        variants: &[VariantSubmission],
        uploads: &UploadSet,
        validation: &mut ValidationState,
    ) -> BackofficeResult<()> {
        self.mapper.map_variants(node, content_type, variants, uploads, validation)?;
        if let Some(alias) = &item.template_alias {
            if node.object_type == ObjectType::Document {
                self.mapper.map_template(node, alias)?;
            }
        }
        if item.release_date.is_some() {
            node.release_date = item.release_date;
        }
        if item.expire_date.is_some() {
            node.expire_date = item.expire_date;
        }
        Ok(())
    }

    fn validate(
        node: &ContentNode,
        content_type: &ContentType,
        variants: &[VariantSubmission],
        validation: &mut ValidationState,
    ) {
        for (index, variant) in variants.iter().enumerate() {
            let culture = if content_type.varies_by_culture {
                variant.culture.as_deref()
            } else {
                None
            };
            if variant.name.trim().is_empty() {
                validation.add_name_error(culture, "Name is required");
            }
            for (alias, violation) in validate_properties(node, content_type, culture) {
                let varies = content_type
                    .property_type(&alias)
                    .is_some_and(|pt| pt.varies_by_culture);
                if varies {
                    validation.add_violation(&alias, culture, &violation);
                } else if index == 0 {
                    validation.add_violation(&alias, None, &violation);
                }
            }
        }
    }

    fn dispatch(
        &self,
        ctx: &RequestContext,
        intent: SaveIntent,
        node: &mut ContentNode,
        validation: &mut ValidationState,
        notifications: &mut Vec<Notification>,
    ) -> BackofficeResult<SaveOutcome> {
        let user_id = ctx.user_id();
        match intent {
            SaveIntent::Save | SaveIntent::SaveNew => {
                let status = self.content.save(node, user_id)?;
                if status.is_success() {
                    notifications.push(if validation.is_valid() {
                        Notification::saved()
                    } else {
                        Notification::saved_with_errors()
                    });
                }
                Ok(SaveOutcome::Saved { status })
            }
            SaveIntent::SendToPublish | SaveIntent::SendToPublishNew => {
                let sent = self.content.send_to_publication(node, user_id)?;
                if sent {
                    notifications.push(if validation.is_valid() {
                        Notification::sent_to_publish()
                    } else {
                        Notification::saved_with_errors()
                    });
                }
                Ok(SaveOutcome::SentToPublish { sent })
            }
            SaveIntent::Publish | SaveIntent::PublishNew => {
                let result = self.content.save_and_publish(node, user_id, ctx.now)?;
                *node = result.node;
                for alias in &result.invalid_properties {
                    validation.add_property_error(alias, None, "Value is invalid");
                }
                let name = node.name_for(ctx.culture()).unwrap_or_default().to_string();
                notifications.push(Notification::for_publish_status(result.status, &name));
                if result.status.is_success() {
                    info!("Node {} published by user {}", node.id, user_id);
                }
                Ok(SaveOutcome::Published {
                    status: result.status,
                    invalid_properties: result.invalid_properties,
                })
            }
        }
    }
}
