mod common;

use arbor_backoffice::{PropertyValueMapper, UploadSet, ValidationState, VariantSubmission};
use arbor_model::converter::{TAGS, TEXT_BOX};
use arbor_model::{
    ContentNode, ContentType, ConversionInput, DataType, PropertyType, TagStorage, TagSupport,
    ValueConverter, ValueConverterRegistry,
};
use arbor_types::{NodeId, NodePath, ObjectType};
use common::{HOME_TEMPLATE, PAGE_TYPE, make_content_type, make_data_type, make_fixture, Fixture};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

const PIPE_EDITOR: &str = "Test.LooseTags";
const TAGGED_TYPE: i32 = 20;

/// Stores tags but leaves the delimiter to the host.
struct LooseTags;

impl ValueConverter for LooseTags {
    fn editor_alias(&self) -> &str {
        PIPE_EDITOR
    }

    fn tag_support(&self) -> Option<TagSupport> {
        Some(TagSupport {
            delimiter: None,
            storage: TagStorage::Csv,
        })
    }

    fn from_editor(
        &self,
        input: &ConversionInput,
        _previous: Option<&Value>,
    ) -> Result<Value, String> {
        Ok(input.value.clone())
    }
}

fn data_type_with(id: i32, editor: &str, configuration: Value) -> DataType {
    DataType {
        configuration,
        ..make_data_type(id, "custom", editor)
    }
}

fn make_tagged_type(fx: &Fixture) -> ContentType {
    fx.schema.put_data_type(data_type_with(30, PIPE_EDITOR, json!({}))).unwrap();
    fx.schema
        .put_data_type(data_type_with(31, PIPE_EDITOR, json!({ "delimiter": ";" })))
        .unwrap();
    fx.schema
        .put_data_type(data_type_with(32, TAGS, json!({ "storageType": "Json" })))
        .unwrap();
    fx.schema
        .put_data_type(data_type_with(33, TEXT_BOX, json!({ "maxChars": 5 })))
        .unwrap();
    let content_type = make_content_type(
        TAGGED_TYPE,
        "tagged",
        ObjectType::Document,
        true,
        Vec::new(),
        vec![
            PropertyType::new(21, "labels", "Labels", 30),
            PropertyType::new(22, "keywords", "Keywords", 31),
            PropertyType::new(23, "topics", "Topics", 32),
            PropertyType::new(24, "short", "Short", 33),
            PropertyType::new(25, "orphan", "Orphan", 999),
        ],
    );
    fx.schema.put_content_type(content_type.clone()).unwrap();
    content_type
}

fn make_mapper(fx: &Fixture, default_delimiter: char) -> PropertyValueMapper {
    let converters = ValueConverterRegistry::with_builtins();
    converters.register(Arc::new(LooseTags));
    PropertyValueMapper::new(
        fx.schema.clone(),
        fx.catalog.clone(),
        Arc::new(converters),
        default_delimiter,
    )
}

fn scaffold(content_type: &ContentType) -> ContentNode {
    ContentNode::scaffold(content_type, &NodePath::root(), 1)
}

fn stored(node: &ContentNode, alias: &str) -> Option<Value> {
    node.property(alias).and_then(|p| p.get_value(None)).cloned()
}

fn map(
    mapper: &PropertyValueMapper,
    node: &mut ContentNode,
    content_type: &ContentType,
    variant: VariantSubmission,
) -> ValidationState {
    let mut validation = ValidationState::new();
    mapper
        .map_variants(node, content_type, &[variant], &UploadSet::empty(), &mut validation)
        .unwrap();
    validation
}

// ── Tags ────────────────────────────────────────────────────────

#[test]
fn builtin_tags_use_the_editor_delimiter() {
    let fx = make_fixture();
    let mapper = make_mapper(&fx, '|');
    let page = fx.schema_type(PAGE_TYPE);
    let mut node = scaffold(&page);

    let variant = VariantSubmission::invariant("Home").with_property("tags", json!("a, b,,a"));
    map(&mapper, &mut node, &page, variant);
    assert_eq!(stored(&node, "tags"), Some(json!("a,b")));
}

#[test]
fn undeclared_delimiter_falls_back_to_configured_default() {
    let fx = make_fixture();
    let tagged = make_tagged_type(&fx);
    let mapper = make_mapper(&fx, '|');
    let mut node = scaffold(&tagged);

    map(
        &mapper,
        &mut node,
        &tagged,
        VariantSubmission::invariant("T").with_property("labels", json!(["x", "y", "x"])),
    );
    assert_eq!(stored(&node, "labels"), Some(json!("x|y")));
}

#[test]
fn data_type_delimiter_wins_over_every_fallback() {
    let fx = make_fixture();
    let tagged = make_tagged_type(&fx);
    let mapper = make_mapper(&fx, '|');
    let mut node = scaffold(&tagged);

    map(
        &mapper,
        &mut node,
        &tagged,
        VariantSubmission::invariant("T").with_property("keywords", json!("one;two")),
    );
    assert_eq!(stored(&node, "keywords"), Some(json!("one;two")));
}

#[test]
fn json_tag_storage_keeps_an_array() {
    let fx = make_fixture();
    let tagged = make_tagged_type(&fx);
    let mapper = make_mapper(&fx, ',');
    let mut node = scaffold(&tagged);

    map(
        &mapper,
        &mut node,
        &tagged,
        VariantSubmission::invariant("T").with_property("topics", json!("rust, cms")),
    );
    assert_eq!(stored(&node, "topics"), Some(json!(["rust", "cms"])));
}

// ── Skipped and rejected fields ─────────────────────────────────

#[test]
fn read_only_fields_are_not_written() {
    let fx = make_fixture();
    let mapper = make_mapper(&fx, ',');
    let page = fx.schema_type(PAGE_TYPE);
    let mut node = scaffold(&page);
    node.property_mut("views").unwrap().set_value(json!(42), None);

    let validation = map(
        &mapper,
        &mut node,
        &page,
        VariantSubmission::invariant("Home").with_property("views", json!(0)),
    );
    assert!(validation.is_valid());
    assert_eq!(stored(&node, "views"), Some(json!(42)));
}

#[test]
fn unknown_alias_and_missing_data_type_are_skipped() {
    let fx = make_fixture();
    let tagged = make_tagged_type(&fx);
    let mapper = make_mapper(&fx, ',');
    let mut node = scaffold(&tagged);

    let validation = map(
        &mapper,
        &mut node,
        &tagged,
        VariantSubmission::invariant("T")
            .with_property("nonexistent", json!("x"))
            .with_property("orphan", json!("y"))
            .with_property("labels", json!("kept")),
    );
    assert!(validation.is_valid());
    assert!(node.property("nonexistent").is_none());
    assert_eq!(stored(&node, "orphan"), None);
    assert_eq!(stored(&node, "labels"), Some(json!("kept")));
}

#[test]
fn converter_errors_become_field_errors() {
    let fx = make_fixture();
    let tagged = make_tagged_type(&fx);
    let mapper = make_mapper(&fx, ',');
    let mut node = scaffold(&tagged);

    let validation = map(
        &mapper,
        &mut node,
        &tagged,
        VariantSubmission::invariant("T")
            .with_property("short", json!("far too long"))
            .with_property("labels", json!("still mapped")),
    );
    assert_eq!(validation.len(), 1);
    assert!(validation.messages("_Properties.short")[0].contains("exceeds 5"));
    assert_eq!(stored(&node, "short"), None);
    assert_eq!(stored(&node, "labels"), Some(json!("still mapped")));
}

// ── Uploads ─────────────────────────────────────────────────────

#[test]
fn uploads_are_matched_by_alias_and_culture() {
    let fx = make_fixture();
    let mapper = make_mapper(&fx, ',');
    let page = fx.schema_type(PAGE_TYPE);
    let mut node = scaffold(&page);

    let dir = tempfile::tempdir().unwrap();
    let mut uploads = UploadSet::in_dir(dir.path());
    uploads.stage("other", None, "nope.png", b"x").unwrap();
    uploads.stage("image", Some("da-DK"), "wrong.png", b"x").unwrap();
    uploads.stage("image", None, "Right File.PNG", b"x").unwrap();

    let mut validation = ValidationState::new();
    mapper
        .map_variants(
            &mut node,
            &page,
            &[VariantSubmission::invariant("Home").with_property("image", json!("Right File.PNG"))],
            &uploads,
            &mut validation,
        )
        .unwrap();

    let path = stored(&node, "image").unwrap();
    assert!(path.as_str().unwrap().ends_with("/Right-File.png"));
}

#[test]
fn clearing_an_upload_field_without_a_file() {
    let fx = make_fixture();
    let mapper = make_mapper(&fx, ',');
    let page = fx.schema_type(PAGE_TYPE);
    let mut node = scaffold(&page);
    node.property_mut("image").unwrap().set_value(json!("/media/old.png"), None);

    let variant = VariantSubmission::invariant("Home").with_property("image", json!("unchanged"));
    map(&mapper, &mut node, &page, variant);
    assert_eq!(stored(&node, "image"), Some(json!("/media/old.png")));

    let variant = VariantSubmission::invariant("Home").with_property("image", json!(""));
    map(&mapper, &mut node, &page, variant);
    assert_eq!(stored(&node, "image"), None);
}

// ── Names and templates ─────────────────────────────────────────

#[test]
fn blank_names_never_overwrite() {
    let fx = make_fixture();
    let mapper = make_mapper(&fx, ',');
    let page = fx.schema_type(PAGE_TYPE);
    let mut node = scaffold(&page);
    node.set_name("Original", None);

    map(&mapper, &mut node, &page, VariantSubmission::invariant("   "));
    assert_eq!(node.name.as_deref(), Some("Original"));

    map(&mapper, &mut node, &page, VariantSubmission::invariant("  Renamed "));
    assert_eq!(node.name.as_deref(), Some("Renamed"));
}

#[test]
fn invariant_values_come_from_the_first_variant() {
    let fx = make_fixture();
    let mapper = make_mapper(&fx, ',');
    let landing = fx.schema_type(common::LANDING_TYPE);
    let mut node = scaffold(&landing);

    let variants = [
        VariantSubmission::for_culture("en-US", "Home").with_property("slug", json!("first")),
        VariantSubmission::for_culture("da-DK", "Hjem").with_property("slug", json!("second")),
    ];
    let mut validation = ValidationState::new();
    mapper
        .map_variants(&mut node, &landing, &variants, &UploadSet::empty(), &mut validation)
        .unwrap();

    assert_eq!(stored(&node, "slug"), Some(json!("first")));
    assert_eq!(node.name.as_deref(), Some("Home"));
    assert_eq!(node.name_for(Some("da-DK")), Some("Hjem"));
}

#[test]
fn template_aliases_resolve_through_the_catalog() {
    let fx = make_fixture();
    let mapper = make_mapper(&fx, ',');
    let page = fx.schema_type(PAGE_TYPE);
    let mut node = scaffold(&page);

    mapper.map_template(&mut node, " home ").unwrap();
    assert_eq!(node.template_id, Some(HOME_TEMPLATE));
    mapper.map_template(&mut node, "unknown").unwrap();
    assert_eq!(node.template_id, Some(HOME_TEMPLATE));
    mapper.map_template(&mut node, "").unwrap();
    assert_eq!(node.template_id, None);
    assert_eq!(node.parent_id, NodeId::ROOT);
}
