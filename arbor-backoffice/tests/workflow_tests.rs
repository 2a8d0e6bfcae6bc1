mod common;

use arbor_backoffice::{
    BackofficeConfig, BackofficeError, ContentItemSave, NotificationKind, PreviewToken,
    RecordingPreview, SaveIntent, SaveOutcome, SaveWorkflow, UploadSet, VariantSubmission,
};
use arbor_storage::{ContentService, OperationStatus, PublishStatus};
use arbor_types::NodeId;
use chrono::{Duration, Utc};
use common::{
    EDITOR_ID, HOME_TEMPLATE, admin_ctx, editor_ctx, init_tracing, make_fixture, make_fixture_with,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn page(name: &str, title: &str) -> VariantSubmission {
    VariantSubmission::invariant(name).with_property("title", json!(title))
}

// ── Creating ────────────────────────────────────────────────────

#[test]
fn publish_new_page_at_root() {
    init_tracing();
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::PublishNew)
        .with_variant(page("Home", "Welcome"));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    assert_eq!(response.intent, SaveIntent::PublishNew);
    assert_eq!(
        response.outcome,
        SaveOutcome::Published {
            status: PublishStatus::Success,
            invalid_properties: Vec::new(),
        }
    );
    assert!(response.is_valid());
    assert!(!response.node.is_new());

    let stored = fx.node(response.node.id);
    assert!(stored.published);
    assert_eq!(stored.name.as_deref(), Some("Home"));
    assert_eq!(stored.parent_id, NodeId::ROOT);
    assert_eq!(response.notifications[0].message_key, "speechBubbles/editContentPublishedText");
}

#[test]
fn new_node_without_name_is_rejected() {
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::SaveNew)
        .with_variant(page("  ", "Title"));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    assert_eq!(response.outcome, SaveOutcome::Rejected);
    assert!(response.outcome.is_client_error());
    assert!(response.node.is_new());
    let validation = response.validation.unwrap();
    assert!(validation.model_state.contains_key("Name"));
    assert_eq!(fx.content.len().unwrap(), 0);
}

#[test]
fn unknown_content_type_is_not_found() {
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "nope", SaveIntent::SaveNew)
        .with_variant(page("X", "X"));
    let err = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap_err();
    assert!(matches!(err, BackofficeError::NotFound { .. }));
}

#[test]
fn missing_node_is_not_found() {
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::update(NodeId::new(4242), SaveIntent::Save)
        .with_variant(page("X", "X"));
    let err = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap_err();
    assert!(matches!(err, BackofficeError::NotFound { ref kind, .. } if kind == "node"));
}

#[test]
fn publishing_media_is_not_supported() {
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "folder", SaveIntent::PublishNew)
        .with_variant(VariantSubmission::invariant("Images"));
    let err = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap_err();
    assert!(matches!(err, BackofficeError::NotSupported(_)));
    assert_eq!(fx.content.len().unwrap(), 0);
}

#[test]
fn saving_media_is_allowed() {
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "folder", SaveIntent::SaveNew)
        .with_variant(VariantSubmission::invariant("Images"));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();
    assert_eq!(
        response.outcome,
        SaveOutcome::Saved {
            status: OperationStatus::Success
        }
    );
}

// ── Validation and downgrade ────────────────────────────────────

#[test]
fn publish_with_missing_mandatory_value_is_saved_instead() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::update(home.id, SaveIntent::Publish)
        .with_variant(page("Home v2", ""));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    assert_eq!(response.intent, SaveIntent::Save);
    assert_eq!(
        response.outcome,
        SaveOutcome::Saved {
            status: OperationStatus::Success
        }
    );
    let validation = response.validation.unwrap();
    assert_eq!(
        validation.model_state["_Properties.title"],
        vec!["Value cannot be empty".to_string()]
    );
    assert_eq!(response.notifications[0].kind, NotificationKind::Warning);

    let stored = fx.node(home.id);
    assert_eq!(stored.name.as_deref(), Some("Home v2"));
    assert!(!stored.published);
}

#[test]
fn pattern_violation_is_reported_per_property() {
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::SaveNew)
        .with_variant(page("Home", "Welcome").with_property("code", json!("abc")));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    let validation = response.validation.unwrap();
    assert_eq!(validation.model_state.len(), 1);
    assert!(validation.model_state["_Properties.code"][0].contains("^[A-Z]+$"));
    assert!(response.outcome.persisted());
}

#[test]
fn send_to_publish_is_not_downgraded() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::update(home.id, SaveIntent::SendToPublish)
        .with_variant(page("Home", ""));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    assert_eq!(response.intent, SaveIntent::SendToPublish);
    assert_eq!(response.outcome, SaveOutcome::SentToPublish { sent: true });
    assert!(!response.is_valid());
}

// ── Publish results ─────────────────────────────────────────────

#[test]
fn publish_under_unpublished_parent_keeps_the_draft() {
    let fx = make_fixture();
    let parent = fx.add_page(NodeId::ROOT, "Unpublished");
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(parent.id, "article", SaveIntent::PublishNew)
        .with_variant(page("News", "News"));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    assert!(matches!(
        response.outcome,
        SaveOutcome::Published {
            status: PublishStatus::FailedPathNotPublished,
            ..
        }
    ));
    assert!(response.outcome.persisted());
    let stored = fx.node(response.node.id);
    assert!(!stored.published);
    assert_eq!(stored.parent_id, parent.id);

    let notification = &response.notifications[0];
    assert_eq!(notification.message_key, "publish/contentPublishedFailedByParent");
    assert_eq!(notification.args, vec!["'News'".to_string()]);
}

#[test]
fn publish_with_future_release_date_awaits_release() {
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::PublishNew)
        .with_variant(page("Later", "Later"))
        .with_schedule(Some(Utc::now() + Duration::days(1)), None);
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    assert!(matches!(
        response.outcome,
        SaveOutcome::Published {
            status: PublishStatus::FailedAwaitingRelease,
            ..
        }
    ));
    assert!(response.node.release_date.is_some());
}

#[test]
fn republishing_unchanged_content_reports_success() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    fx.publish(home.id);
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::update(home.id, SaveIntent::Publish)
        .with_variant(page("Home", "Home"));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    assert!(matches!(
        response.outcome,
        SaveOutcome::Published {
            status: PublishStatus::SuccessAlreadyPublished,
            ..
        }
    ));
}

// ── Cancellation ────────────────────────────────────────────────

#[test]
fn vetoed_creation_stores_nothing() {
    let fx = make_fixture();
    fx.deny("saving");
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::SaveNew)
        .with_variant(page("Home", "Home"));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    assert_eq!(response.outcome, SaveOutcome::CancelledNew);
    assert!(response.outcome.is_client_error());
    assert_eq!(fx.content.len().unwrap(), 0);
    assert!(
        response
            .notifications
            .iter()
            .any(|n| n.message_key == "speechBubbles/operationCancelledText")
    );
}

#[test]
fn vetoed_publish_leaves_stored_node_alone() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    fx.deny("publishing");
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::update(home.id, SaveIntent::Publish)
        .with_variant(page("Renamed", "Renamed"));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    assert!(response.outcome.was_cancelled());
    assert!(!response.outcome.persisted());
    assert_eq!(fx.node(home.id).name.as_deref(), Some("Home"));
}

#[test]
fn vetoed_send_to_publish_on_new_node() {
    let fx = make_fixture();
    fx.deny("sending-to-publish");
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::SendToPublishNew)
        .with_variant(page("Home", "Home"));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    assert_eq!(response.outcome, SaveOutcome::CancelledNew);
    assert_eq!(fx.content.len().unwrap(), 0);
}

// ── Authorisation ───────────────────────────────────────────────

#[test]
fn missing_publish_letter_is_forbidden() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    fx.permissions.set_default_permissions(EDITOR_ID, "AC").unwrap();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::update(home.id, SaveIntent::Publish)
        .with_variant(page("Hijacked", "Hijacked"));
    let response = workflow
        .execute(&editor_ctx(vec![NodeId::ROOT]), item, UploadSet::empty())
        .unwrap();

    assert_eq!(response.outcome, SaveOutcome::Forbidden);
    let validation = response.validation.unwrap();
    assert_eq!(validation.model_state["permission"], vec!["Missing permission AU".to_string()]);
    assert_eq!(response.node.name.as_deref(), Some("Hijacked"));
    assert_eq!(fx.node(home.id).name.as_deref(), Some("Home"));
}

#[test]
fn save_is_allowed_with_update_letter_only() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    fx.permissions.set_default_permissions(EDITOR_ID, "A").unwrap();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::update(home.id, SaveIntent::Save)
        .with_variant(page("Edited", "Edited"));
    let response = workflow
        .execute(&editor_ctx(vec![NodeId::ROOT]), item, UploadSet::empty())
        .unwrap();
    assert!(response.outcome.persisted());
}

#[test]
fn node_outside_start_nodes_is_forbidden() {
    let fx = make_fixture();
    let site_a = fx.add_page(NodeId::ROOT, "Site A");
    let site_b = fx.add_page(NodeId::ROOT, "Site B");
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::update(site_b.id, SaveIntent::Save).with_variant(page("B", "B"));
    let response = workflow
        .execute(&editor_ctx(vec![site_a.id]), item, UploadSet::empty())
        .unwrap();
    assert_eq!(response.outcome, SaveOutcome::Forbidden);

    let item = ContentItemSave::create(site_a.id, "article", SaveIntent::SaveNew)
        .with_variant(page("A1", "A1"));
    let response = workflow
        .execute(&editor_ctx(vec![site_a.id]), item, UploadSet::empty())
        .unwrap();
    assert!(response.outcome.persisted());
}

// ── Binding ─────────────────────────────────────────────────────

#[test]
fn template_alias_is_applied_and_cleared() {
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::SaveNew)
        .with_variant(page("Home", "Home"))
        .with_template("home");
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();
    assert_eq!(response.node.template_id, Some(HOME_TEMPLATE));
    let id = response.node.id;

    let item = ContentItemSave::update(id, SaveIntent::Save)
        .with_variant(page("Home", "Home"))
        .with_template("missing");
    workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();
    assert_eq!(fx.node(id).template_id, Some(HOME_TEMPLATE));

    let item = ContentItemSave::update(id, SaveIntent::Save)
        .with_variant(page("Home", "Home"))
        .with_template("");
    workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();
    assert_eq!(fx.node(id).template_id, None);
}

#[test]
fn culture_variants_set_names_per_culture() {
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "landing", SaveIntent::SaveNew)
        .with_variant(
            VariantSubmission::for_culture("da-DK", "Forside")
                .with_property("heading", json!("Velkommen"))
                .with_property("slug", json!("forside")),
        )
        .with_variant(
            VariantSubmission::for_culture("en-US", "Front page")
                .with_property("heading", json!("Welcome"))
                .with_property("slug", json!("ignored")),
        );
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();
    assert!(response.is_valid());

    let stored = fx.node(response.node.id);
    assert_eq!(stored.name.as_deref(), Some("Front page"));
    assert_eq!(stored.culture_names["da-DK"], "Forside");
    let heading = stored.property("heading").unwrap();
    assert_eq!(heading.get_value(Some("da-DK")), Some(&json!("Velkommen")));
    assert_eq!(heading.get_value(Some("en-US")), Some(&json!("Welcome")));
    assert_eq!(stored.property("slug").unwrap().get_value(None), Some(&json!("forside")));
}

#[test]
fn missing_culture_name_is_keyed_by_culture() {
    let fx = make_fixture();
    let workflow = SaveWorkflow::new(&fx.services);

    let item = ContentItemSave::create(NodeId::ROOT, "landing", SaveIntent::SaveNew)
        .with_variant(
            VariantSubmission::for_culture("en-US", "Front").with_property("slug", json!("front")),
        )
        .with_variant(VariantSubmission::for_culture("da-DK", ""));
    let response = workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();

    let validation = response.validation.unwrap();
    assert!(validation.model_state.contains_key("Name.da-DK"));
    assert!(response.outcome.persisted());
}

// ── Uploads and preview ─────────────────────────────────────────

#[test]
fn uploads_are_removed_after_a_successful_save() {
    let fx = make_fixture();
    let dir = tempfile::tempdir().unwrap();
    let mut uploads = UploadSet::in_dir(dir.path());
    let staged = uploads
        .stage("image", None, "C:\\fakepath\\My Photo.JPG", b"jpeg")
        .unwrap()
        .temp_path
        .clone();
    assert!(staged.exists());

    let workflow = SaveWorkflow::new(&fx.services);
    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::SaveNew)
        .with_variant(page("Home", "Home").with_property("image", json!("My Photo.JPG")));
    let response = workflow.execute(&admin_ctx(), item, uploads).unwrap();

    assert!(!staged.exists());
    let image = response.node.property("image").unwrap().get_value(None).unwrap();
    assert!(image.as_str().unwrap().starts_with("/media/"));
    assert!(image.as_str().unwrap().ends_with("/My-Photo.jpg"));
}

#[test]
fn uploads_are_removed_when_the_request_fails() {
    let fx = make_fixture();
    let dir = tempfile::tempdir().unwrap();
    let mut uploads = UploadSet::in_dir(dir.path());
    let staged = uploads
        .stage("image", None, "a.png", b"png")
        .unwrap()
        .temp_path
        .clone();

    let workflow = SaveWorkflow::new(&fx.services);
    let item = ContentItemSave::update(NodeId::new(4242), SaveIntent::Save)
        .with_variant(page("X", "X"));
    assert!(workflow.execute(&admin_ctx(), item, uploads).is_err());
    assert!(!staged.exists());
}

#[test]
fn uploads_are_removed_when_creation_is_rejected() {
    let fx = make_fixture();
    let dir = tempfile::tempdir().unwrap();
    let mut uploads = UploadSet::in_dir(dir.path());
    let staged = uploads
        .stage("image", None, "a.png", b"png")
        .unwrap()
        .temp_path
        .clone();

    let workflow = SaveWorkflow::new(&fx.services);
    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::SaveNew)
        .with_variant(page("", "X"));
    let response = workflow.execute(&admin_ctx(), item, uploads).unwrap();
    assert_eq!(response.outcome, SaveOutcome::Rejected);
    assert!(!staged.exists());
}

#[test]
fn uploads_are_staged_under_the_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    let upload_dir = dir.path().join("incoming");
    let fx = make_fixture_with(BackofficeConfig {
        upload_temp_dir: upload_dir.clone(),
        ..BackofficeConfig::default()
    });
    let workflow = SaveWorkflow::new(&fx.services);

    let mut uploads = workflow.uploads();
    let staged = uploads
        .stage("image", None, "a.png", b"png")
        .unwrap()
        .temp_path
        .clone();
    assert!(staged.starts_with(&upload_dir));
    assert!(staged.exists());

    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::SaveNew)
        .with_variant(page("Home", "Home").with_property("image", json!("a.png")));
    workflow.execute(&admin_ctx(), item, uploads).unwrap();
    assert!(!staged.exists());
}

#[test]
fn preview_is_refreshed_for_existing_nodes_only() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    let preview = Arc::new(RecordingPreview::new());
    let services = fx.services.clone().with_preview(preview.clone());
    let workflow = SaveWorkflow::new(&services);
    let token = PreviewToken::new("preview-1");
    let ctx = admin_ctx().with_preview(token.clone());

    let item = ContentItemSave::update(home.id, SaveIntent::Save)
        .with_variant(page("Home", "Home"));
    workflow.execute(&ctx, item, UploadSet::empty()).unwrap();
    assert_eq!(preview.take(), vec![(token.clone(), home.id)]);

    let item = ContentItemSave::create(NodeId::ROOT, "page", SaveIntent::SaveNew)
        .with_variant(page("New", "New"));
    workflow.execute(&ctx, item, UploadSet::empty()).unwrap();
    assert!(preview.take().is_empty());
}

#[test]
fn preview_is_not_refreshed_without_a_token() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    let preview = Arc::new(RecordingPreview::new());
    let services = fx.services.clone().with_preview(preview.clone());
    let workflow = SaveWorkflow::new(&services);

    let item = ContentItemSave::update(home.id, SaveIntent::Save)
        .with_variant(page("Home", "Home"));
    workflow.execute(&admin_ctx(), item, UploadSet::empty()).unwrap();
    assert!(preview.take().is_empty());
    assert!(fx.content.get_by_id(home.id).unwrap().is_some());
}
