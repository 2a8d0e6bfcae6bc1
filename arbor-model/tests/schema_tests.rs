use arbor_model::{
    ContentNode, ContentType, ModelError, Property, PropertyType, PropertyViolation,
    TagConfiguration, TagStorage, invalid_property_aliases, validate_properties,
};
use arbor_types::{NodeKey, NodePath, ObjectType};
use pretty_assertions::assert_eq;
use serde_json::json;

fn make_content_type(property_types: Vec<PropertyType>) -> ContentType {
    ContentType {
        id: 1,
        key: NodeKey::new(),
        alias: "page".into(),
        name: "Page".into(),
        object_type: ObjectType::Document,
        allowed_as_root: true,
        allowed_children: vec![2, 3],
        property_types,
        groups: Vec::new(),
        varies_by_culture: true,
        allowed_templates: Vec::new(),
    }
}

// ── Content type lookups ─────────────────────────────────────────

#[test]
fn allows_child_checks_allowed_set() {
    let ct = make_content_type(Vec::new());
    assert!(ct.allows_child(2));
    assert!(!ct.allows_child(1));
}

#[test]
fn require_property_type_reports_unknown_alias() {
    let ct = make_content_type(vec![PropertyType::new(1, "title", "Title", 1)]);
    assert!(ct.require_property_type("title").is_ok());
    assert!(matches!(
        ct.require_property_type("missing"),
        Err(ModelError::UnknownProperty(alias)) if alias == "missing"
    ));
}

#[test]
fn content_type_deserializes_with_defaults() {
    let ct: ContentType = serde_json::from_value(json!({
        "id": 4,
        "key": "3cce2545-e3ac-44ec-bf55-a52cc5965db3",
        "alias": "folder",
        "name": "Folder",
        "object_type": "Media"
    }))
    .unwrap();
    assert!(!ct.allowed_as_root);
    assert!(ct.allowed_children.is_empty());
    assert_eq!(ct.object_type, ObjectType::Media);
}

// ── Property validation ──────────────────────────────────────────

#[test]
fn mandatory_empty_property_is_invalid() {
    let ct = make_content_type(vec![
        PropertyType::new(1, "title", "Title", 1).mandatory(),
        PropertyType::new(2, "body", "Body", 1),
    ]);
    let node = ContentNode::scaffold(&ct, &NodePath::root(), 0);
    assert_eq!(
        validate_properties(&node, &ct, None),
        vec![("title".to_string(), PropertyViolation::Mandatory)]
    );
}

#[test]
fn regex_mismatch_is_invalid() {
    let code = PropertyType::new(1, "code", "Code", 1).with_regex(r"^[A-Z]{3}$");
    let ct = make_content_type(vec![code]);
    let mut node = ContentNode::scaffold(&ct, &NodePath::root(), 0);

    node.property_mut("code").unwrap().set_value(json!("abc"), None);
    assert_eq!(invalid_property_aliases(&node, &ct, None), vec!["code".to_string()]);

    node.property_mut("code").unwrap().set_value(json!("ABC"), None);
    assert!(invalid_property_aliases(&node, &ct, None).is_empty());
}

#[test]
fn empty_optional_property_skips_regex() {
    let ct = make_content_type(vec![PropertyType::new(1, "code", "Code", 1).with_regex(r"^\d+$")]);
    let node = ContentNode::scaffold(&ct, &NodePath::root(), 0);
    assert!(invalid_property_aliases(&node, &ct, None).is_empty());
}

#[test]
fn malformed_regex_is_ignored() {
    let ct = make_content_type(vec![PropertyType::new(1, "code", "Code", 1).with_regex("([")]);
    let mut node = ContentNode::scaffold(&ct, &NodePath::root(), 0);
    node.property_mut("code").unwrap().set_value(json!("x"), None);
    assert!(invalid_property_aliases(&node, &ct, None).is_empty());
}

#[test]
fn variant_property_checked_in_requested_culture() {
    let ct = make_content_type(vec![
        PropertyType::new(1, "title", "Title", 1).mandatory().varying_by_culture(),
    ]);
    let mut node = ContentNode::scaffold(&ct, &NodePath::root(), 0);
    node.property_mut("title").unwrap().set_value(json!("Hi"), Some("en-US"));

    assert!(invalid_property_aliases(&node, &ct, Some("en-US")).is_empty());
    assert_eq!(invalid_property_aliases(&node, &ct, Some("da-DK")), vec!["title".to_string()]);
}

// ── Tags ─────────────────────────────────────────────────────────

#[test]
fn tags_csv_are_trimmed_and_deduplicated() {
    let mut p = Property::new("tags");
    let config = TagConfiguration::default().with_fallback_delimiter(';');
    p.set_tags_value(&json!(" a; b ;a;;c"), &config, None);
    assert_eq!(p.get_value(None), Some(&json!("a;b;c")));
}

#[test]
fn tags_json_storage_stores_array() {
    let mut p = Property::new("tags");
    let config = TagConfiguration {
        storage_type: TagStorage::Json,
        ..TagConfiguration::default()
    }
    .with_fallback_delimiter(',');
    p.set_tags_value(&json!(["x", " y ", "x"]), &config, None);
    assert_eq!(p.get_value(None), Some(&json!(["x", "y"])));
}

#[test]
fn explicit_delimiter_wins_over_fallback() {
    let config = TagConfiguration {
        delimiter: Some('|'),
        ..TagConfiguration::default()
    };
    assert_eq!(config.with_fallback_delimiter(',').delimiter, Some('|'));
}

#[test]
fn tag_configuration_reads_data_type_config() {
    let config = TagConfiguration::from_data_type_configuration(&json!({
        "group": "topics",
        "storageType": "Json",
    }));
    assert_eq!(config.group, "topics");
    assert_eq!(config.storage_type, TagStorage::Json);
    assert_eq!(config.delimiter, None);

    let fallback = TagConfiguration::from_data_type_configuration(&json!("garbage"));
    assert_eq!(fallback, TagConfiguration::default());
}

#[test]
fn malformed_tag_fields_do_not_reset_the_others() {
    let config = TagConfiguration::from_data_type_configuration(&json!({
        "storageType": "Json",
        "delimiter": ";;",
    }));
    assert_eq!(config.storage_type, TagStorage::Json);
    assert_eq!(config.delimiter, None);

    let config = TagConfiguration::from_data_type_configuration(&json!({
        "storageType": "Json",
        "group": 7,
        "delimiter": ";",
    }));
    assert_eq!(config.storage_type, TagStorage::Json);
    assert_eq!(config.group, "default");
    assert_eq!(config.delimiter, Some(';'));

    let config = TagConfiguration::from_data_type_configuration(&json!({
        "storageType": "Xml",
        "group": "topics",
    }));
    assert_eq!(config.storage_type, TagStorage::Csv);
    assert_eq!(config.group, "topics");
}
