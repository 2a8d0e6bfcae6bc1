mod common;

use arbor_backoffice::{BackofficeConfig, BackofficeError, PermissionGate};
use arbor_storage::{PermissionStore, SqlitePermissionStore, StorageResult};
use arbor_types::{NodeId, ObjectType};
use common::{ADMIN_ID, EDITOR_ID, FOLDER_TYPE, make_admin, make_editor, make_fixture, Fixture};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts every lookup before delegating.
struct CountingStore {
    inner: SqlitePermissionStore,
    lookups: AtomicUsize,
}

impl CountingStore {
    fn new(inner: SqlitePermissionStore) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl PermissionStore for CountingStore {
    fn get_permissions(&self, user_id: i32, node_id: NodeId) -> StorageResult<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_permissions(user_id, node_id)
    }

    fn default_permissions(&self, user_id: i32) -> StorageResult<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.default_permissions(user_id)
    }
}

fn make_gate(fx: &Fixture) -> PermissionGate {
    PermissionGate::new(
        fx.content.clone(),
        fx.permissions.clone(),
        Arc::new(BackofficeConfig::default()),
    )
}

// ── Path access ─────────────────────────────────────────────────

#[test]
fn root_user_reaches_root_bin_and_nodes() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    let gate = make_gate(&fx);
    let admin = make_admin();
    let bin = NodeId::RECYCLE_BIN_CONTENT;

    assert!(gate.has_access(&admin, NodeId::ROOT, ObjectType::Document, "C").unwrap());
    assert!(gate.has_access(&admin, bin, ObjectType::Document, "").unwrap());
    assert!(gate.has_access(&admin, home.id, ObjectType::Document, "AU").unwrap());
}

#[test]
fn scoped_user_reaches_only_their_subtree() {
    let fx = make_fixture();
    let site = fx.add_page(NodeId::ROOT, "Site");
    let child = fx.add_page(site.id, "Child");
    let other = fx.add_page(NodeId::ROOT, "Other");
    let gate = make_gate(&fx);
    let editor = make_editor(vec![site.id]);
    let bin = NodeId::RECYCLE_BIN_CONTENT;

    assert!(gate.has_access(&editor, site.id, ObjectType::Document, "A").unwrap());
    assert!(gate.has_access(&editor, child.id, ObjectType::Document, "A").unwrap());
    assert!(!gate.has_access(&editor, other.id, ObjectType::Document, "A").unwrap());
    assert!(!gate.has_access(&editor, NodeId::ROOT, ObjectType::Document, "").unwrap());
    assert!(!gate.has_access(&editor, bin, ObjectType::Document, "").unwrap());
}

#[test]
fn trashed_nodes_are_out_of_reach_for_scoped_users() {
    use arbor_storage::ContentService;

    let fx = make_fixture();
    let site = fx.add_page(NodeId::ROOT, "Site");
    let child = fx.add_page(site.id, "Child");
    fx.content.move_to_recycle_bin(child.id, ADMIN_ID).unwrap();
    let gate = make_gate(&fx);

    let editor = make_editor(vec![site.id]);
    assert!(!gate.has_access(&editor, child.id, ObjectType::Document, "").unwrap());
    assert!(gate.has_access(&make_admin(), child.id, ObjectType::Document, "").unwrap());
}

#[test]
fn missing_node_is_not_found() {
    let fx = make_fixture();
    let gate = make_gate(&fx);
    let err = gate
        .has_access(&make_admin(), NodeId::new(9999), ObjectType::Document, "A")
        .unwrap_err();
    assert!(matches!(err, BackofficeError::NotFound { .. }));
}

// ── Letters ─────────────────────────────────────────────────────

#[test]
fn every_required_letter_must_be_assigned() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    fx.permissions.set_default_permissions(EDITOR_ID, "AC").unwrap();
    let gate = make_gate(&fx);
    let editor = make_editor(vec![NodeId::ROOT]);

    assert!(gate.has_access(&editor, home.id, ObjectType::Document, "A").unwrap());
    assert!(gate.has_access(&editor, home.id, ObjectType::Document, "CA").unwrap());
    assert!(!gate.has_access(&editor, home.id, ObjectType::Document, "AU").unwrap());
}

#[test]
fn explicit_assignment_overrides_defaults_below_it() {
    let fx = make_fixture();
    let site = fx.add_page(NodeId::ROOT, "Site");
    let locked = fx.add_page(site.id, "Locked");
    let inner = fx.add_page(locked.id, "Inner");
    fx.permissions.set_permissions(EDITOR_ID, locked.id, "A").unwrap();
    let gate = make_gate(&fx);
    let editor = make_editor(vec![NodeId::ROOT]);

    assert!(gate.has_access(&editor, site.id, ObjectType::Document, "D").unwrap());
    assert!(!gate.has_access(&editor, locked.id, ObjectType::Document, "D").unwrap());
    assert!(!gate.has_access(&editor, inner.id, ObjectType::Document, "D").unwrap());
}

#[test]
fn user_without_any_record_is_denied() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    let gate = make_gate(&fx);
    let stranger = arbor_model::User::new(77, "Stranger");

    assert!(!gate.has_access(&stranger, home.id, ObjectType::Document, "A").unwrap());
    assert!(gate.has_access(&stranger, home.id, ObjectType::Document, "").unwrap());
}

#[test]
fn letters_only_apply_to_documents() {
    let fx = make_fixture();
    let folder = fx.add_node(FOLDER_TYPE, NodeId::ROOT, "Images");
    fx.permissions.set_default_permissions(EDITOR_ID, "A").unwrap();
    let gate = make_gate(&fx);
    let editor = make_editor(vec![NodeId::ROOT]);

    assert!(gate.has_access(&editor, folder.id, ObjectType::Media, "D").unwrap());
}

#[test]
fn media_uses_media_start_nodes() {
    let fx = make_fixture();
    let images = fx.add_node(FOLDER_TYPE, NodeId::ROOT, "Images");
    let docs = fx.add_node(FOLDER_TYPE, NodeId::ROOT, "Docs");
    let gate = make_gate(&fx);
    let editor = make_editor(Vec::new()).with_media_start_nodes(vec![images.id]);

    assert!(gate.has_access(&editor, images.id, ObjectType::Media, "").unwrap());
    assert!(!gate.has_access(&editor, docs.id, ObjectType::Media, "").unwrap());
    assert!(!gate.has_access(&editor, NodeId::RECYCLE_BIN_MEDIA, ObjectType::Media, "").unwrap());
}

#[test]
fn letters_are_not_fetched_outside_start_nodes() {
    let fx = make_fixture();
    let site = fx.add_page(NodeId::ROOT, "Site");
    let other = fx.add_page(NodeId::ROOT, "Other");
    let inner = SqlitePermissionStore::open_in_memory().unwrap();
    inner.set_default_permissions(EDITOR_ID, "A").unwrap();
    let store = Arc::new(CountingStore::new(inner));
    let config = Arc::new(BackofficeConfig::default());
    let gate = PermissionGate::new(fx.content.clone(), store.clone(), config);
    let editor = make_editor(vec![site.id]);

    assert!(!gate.has_access(&editor, other.id, ObjectType::Document, "A").unwrap());
    assert_eq!(store.lookups(), 0);

    assert!(gate.has_access(&editor, site.id, ObjectType::Document, "A").unwrap());
    assert!(store.lookups() > 0);
}

#[test]
fn empty_requirement_skips_the_store() {
    let fx = make_fixture();
    let home = fx.add_page(NodeId::ROOT, "Home");
    let store = Arc::new(CountingStore::new(SqlitePermissionStore::open_in_memory().unwrap()));
    let config = Arc::new(BackofficeConfig::default());
    let gate = PermissionGate::new(fx.content.clone(), store.clone(), config);

    assert!(gate.has_access(&make_admin(), home.id, ObjectType::Document, "").unwrap());
    assert_eq!(store.lookups(), 0);
}
