use crate::entity::ContentNode;
use crate::schema::{ContentType, PropertyType};
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// Why a property failed model validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyViolation {
    Mandatory,
    Pattern(String),
}

/// Checks every property type of `content_type` against `node`.
///
/// Culture-variant properties are checked in `culture`; invariant ones in
/// the invariant slot. Returns `(alias, violation)` pairs in schema order.
pub fn validate_properties(
    node: &ContentNode,
    content_type: &ContentType,
    culture: Option<&str>,
) -> Vec<(String, PropertyViolation)> {
    content_type
        .property_types
        .iter()
        .filter_map(|pt| {
            let culture = if pt.varies_by_culture { culture } else { None };
            check_property(node, pt, culture).map(|v| (pt.alias.clone(), v))
        })
        .collect()
}

/// Aliases of properties that would block publishing.
pub fn invalid_property_aliases(
    node: &ContentNode,
    content_type: &ContentType,
    culture: Option<&str>,
) -> Vec<String> {
    validate_properties(node, content_type, culture)
        .into_iter()
        .map(|(alias, _)| alias)
        .collect()
}

fn check_property(
    node: &ContentNode,
    pt: &PropertyType,
    culture: Option<&str>,
) -> Option<PropertyViolation> {
    let property = node.property(&pt.alias);
    let empty = property.is_none_or(|p| p.is_empty(culture));
    if empty {
        return pt.mandatory.then_some(PropertyViolation::Mandatory);
    }

    let pattern = pt.validation_regex.as_deref().filter(|r| !r.is_empty())?;
    let regex = match Regex::new(pattern) {
        Ok(r) => r,
        Err(e) => {
            warn!("Ignoring invalid validation pattern on {}: {}", pt.alias, e);
            return None;
        }
    };
    let text = match property.and_then(|p| p.get_value(culture)) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => return None,
    };
    (!regex.is_match(&text)).then(|| PropertyViolation::Pattern(pattern.to_string()))
}
