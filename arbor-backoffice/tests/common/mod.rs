//! Shared fixture for back-office tests: a small schema, catalog and
//! permission store wired into [`Services`].

#![allow(dead_code)]

use arbor_backoffice::{BackofficeConfig, RequestContext, Services};
use arbor_model::converter::{LABEL, TAGS, TEXT_BOX, UPLOAD_FIELD};
use arbor_model::{ContentNode, ContentType, DataType, Language, PropertyType, Template, User};
use arbor_storage::{
    CatalogData, ContentObserver, ContentService, MemoryCatalog, MemoryContentService,
    MemorySchemaService, NotificationBus, OperationStatus, SqlitePermissionStore,
};
use arbor_types::{ContentEvent, NodeId, NodeKey, NodePath, ObjectType, Verdict};
use serde_json::json;
use std::sync::Arc;

pub const PAGE_TYPE: i32 = 1;
pub const ARTICLE_TYPE: i32 = 2;
pub const FOLDER_TYPE: i32 = 3;
pub const MEMBER_TYPE: i32 = 4;
pub const LANDING_TYPE: i32 = 5;

pub const TEXT_DT: i32 = 10;
pub const TAGS_DT: i32 = 11;
pub const UPLOAD_DT: i32 = 12;
pub const LABEL_DT: i32 = 13;

pub const HOME_TEMPLATE: i32 = 100;

pub const ADMIN_ID: i32 = 1;
pub const EDITOR_ID: i32 = 2;

pub const ALL_LETTERS: &str = "ACUHMOSDZ";

pub fn make_content_type(
    id: i32,
    alias: &str,
    object_type: ObjectType,
    allowed_as_root: bool,
    allowed_children: Vec<i32>,
    property_types: Vec<PropertyType>,
) -> ContentType {
    ContentType {
        id,
        key: NodeKey::new(),
        alias: alias.into(),
        name: alias.to_uppercase(),
        object_type,
        allowed_as_root,
        allowed_children,
        property_types,
        groups: Vec::new(),
        varies_by_culture: false,
        allowed_templates: Vec::new(),
    }
}

pub fn make_data_type(id: i32, name: &str, editor_alias: &str) -> DataType {
    DataType {
        id,
        key: NodeKey::new(),
        name: name.into(),
        editor_alias: editor_alias.into(),
        configuration: json!({}),
        ignore_user_start_nodes: false,
    }
}

pub fn make_schema() -> MemorySchemaService {
    let schema = MemorySchemaService::new();
    schema
        .put_content_type(make_content_type(
            PAGE_TYPE,
            "page",
            ObjectType::Document,
            true,
            vec![PAGE_TYPE, ARTICLE_TYPE],
            vec![
                PropertyType::new(1, "title", "Title", TEXT_DT).mandatory(),
                PropertyType::new(2, "code", "Code", TEXT_DT).with_regex("^[A-Z]+$"),
                PropertyType::new(3, "tags", "Tags", TAGS_DT),
                PropertyType::new(4, "image", "Image", UPLOAD_DT),
                PropertyType::new(5, "views", "Views", LABEL_DT),
            ],
        ))
        .unwrap();
    schema
        .put_content_type(make_content_type(
            ARTICLE_TYPE,
            "article",
            ObjectType::Document,
            false,
            Vec::new(),
            vec![PropertyType::new(6, "title", "Title", TEXT_DT)],
        ))
        .unwrap();
    schema
        .put_content_type(make_content_type(
            FOLDER_TYPE,
            "folder",
            ObjectType::Media,
            true,
            vec![FOLDER_TYPE],
            Vec::new(),
        ))
        .unwrap();
    schema
        .put_content_type(make_content_type(
            MEMBER_TYPE,
            "member",
            ObjectType::Member,
            true,
            Vec::new(),
            Vec::new(),
        ))
        .unwrap();

    let mut landing = make_content_type(
        LANDING_TYPE,
        "landing",
        ObjectType::Document,
        true,
        Vec::new(),
        vec![
            PropertyType::new(7, "heading", "Heading", TEXT_DT).varying_by_culture(),
            PropertyType::new(8, "slug", "Slug", TEXT_DT).mandatory(),
        ],
    );
    landing.varies_by_culture = true;
    schema.put_content_type(landing).unwrap();

    schema.put_data_type(make_data_type(TEXT_DT, "Textstring", TEXT_BOX)).unwrap();
    schema.put_data_type(make_data_type(TAGS_DT, "Tags", TAGS)).unwrap();
    schema.put_data_type(make_data_type(UPLOAD_DT, "Upload", UPLOAD_FIELD)).unwrap();
    schema.put_data_type(make_data_type(LABEL_DT, "Label", LABEL)).unwrap();
    schema
}

pub fn make_catalog() -> MemoryCatalog {
    MemoryCatalog::new(CatalogData {
        templates: vec![Template {
            id: HOME_TEMPLATE,
            key: NodeKey::new(),
            alias: "home".into(),
            name: "Home".into(),
            path: "/views/home.html".into(),
        }],
        languages: vec![
            Language {
                id: 1,
                iso_code: "en-US".into(),
                culture_name: "English (United States)".into(),
                is_default: true,
                is_mandatory: true,
            },
            Language {
                id: 2,
                iso_code: "da-DK".into(),
                culture_name: "Danish".into(),
                is_default: false,
                is_mandatory: false,
            },
        ],
        users: vec![make_admin(), make_editor(Vec::new())],
        ..CatalogData::default()
    })
}

/// Sees both trees from the root.
pub fn make_admin() -> User {
    User::new(ADMIN_ID, "Admin")
}

/// Scoped to `start_nodes` in the content tree.
pub fn make_editor(start_nodes: Vec<NodeId>) -> User {
    User::new(EDITOR_ID, "Editor").with_content_start_nodes(start_nodes)
}

pub struct Fixture {
    pub bus: Arc<NotificationBus>,
    pub schema: Arc<MemorySchemaService>,
    pub content: Arc<MemoryContentService>,
    pub catalog: Arc<MemoryCatalog>,
    pub permissions: Arc<SqlitePermissionStore>,
    pub services: Services,
}

pub fn make_fixture() -> Fixture {
    make_fixture_with(BackofficeConfig::default())
}

pub fn make_fixture_with(config: BackofficeConfig) -> Fixture {
    let schema = Arc::new(make_schema());
    let bus = Arc::new(NotificationBus::new());
    let content = Arc::new(MemoryContentService::new(schema.clone(), bus.clone()));
    let catalog = Arc::new(make_catalog());
    let permissions = Arc::new(SqlitePermissionStore::open_in_memory().unwrap());
    permissions.set_default_permissions(ADMIN_ID, ALL_LETTERS).unwrap();
    permissions.set_default_permissions(EDITOR_ID, ALL_LETTERS).unwrap();

    let services = Services::new(
        content.clone(),
        schema.clone(),
        catalog.clone(),
        permissions.clone(),
    )
    .with_config(config);
    Fixture {
        bus,
        schema,
        content,
        catalog,
        permissions,
        services,
    }
}

impl Fixture {
    /// Stores a node of `type_id` under `parent` directly, bypassing the
    /// workflow.
    pub fn add_node(&self, type_id: i32, parent: NodeId, name: &str) -> ContentNode {
        let content_type = self.schema_type(type_id);
        let parent_path = if parent.is_root() {
            NodePath::root()
        } else {
            self.content.get_by_id(parent).unwrap().unwrap().path
        };
        let mut node = ContentNode::scaffold(&content_type, &parent_path, ADMIN_ID);
        node.set_name(name, None);
        if let Some(title) = node.property_mut("title") {
            title.set_value(json!(name), None);
        }
        assert_eq!(self.content.save(&mut node, ADMIN_ID).unwrap(), OperationStatus::Success);
        node
    }

    pub fn add_page(&self, parent: NodeId, name: &str) -> ContentNode {
        self.add_node(PAGE_TYPE, parent, name)
    }

    pub fn publish(&self, id: NodeId) {
        let mut node = self.content.get_by_id(id).unwrap().unwrap();
        let result = self
            .content
            .save_and_publish(&mut node, ADMIN_ID, chrono::Utc::now())
            .unwrap();
        assert!(result.status.is_success(), "publish of {id} failed: {:?}", result.status);
    }

    pub fn node(&self, id: NodeId) -> ContentNode {
        self.content.get_by_id(id).unwrap().unwrap()
    }

    pub fn schema_type(&self, type_id: i32) -> ContentType {
        use arbor_storage::SchemaService;
        self.schema.content_type(type_id).unwrap().unwrap()
    }

    /// Vetoes every event whose operation name is `operation`.
    pub fn deny(&self, operation: &'static str) {
        let observer: Arc<dyn ContentObserver> = Arc::new(move |e: &ContentEvent| {
            if e.operation.name() == operation {
                Verdict::deny("blocked by test")
            } else {
                Verdict::Allow
            }
        });
        self.bus.subscribe(observer);
    }
}

pub fn admin_ctx() -> RequestContext {
    RequestContext::new(make_admin())
}

pub fn editor_ctx(start_nodes: Vec<NodeId>) -> RequestContext {
    RequestContext::new(make_editor(start_nodes))
}

/// Initialises a test subscriber so `RUST_LOG=debug` shows the trace.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
