//! Named field access used by runtime filter expressions.
//!
//! Types that can be filtered expose a static list of public field names
//! with their kinds, and a getter returning the current value by name.
//! Names are PascalCase and matched case-sensitively.

use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

/// Static type of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Text,
    Key,
}

/// A field value read from an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Key(Uuid),
}

impl FieldKind {
    /// Parses a filter constant into a value of this kind.
    ///
    /// Booleans accept `true`/`false` in any case. Returns `None` when the
    /// constant does not fit the kind.
    pub fn parse_constant(&self, raw: &str) -> Option<FieldValue> {
        let raw = raw.trim();
        match self {
            Self::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => Some(FieldValue::Bool(true)),
                "false" => Some(FieldValue::Bool(false)),
                _ => None,
            },
            Self::Int => raw.parse::<i64>().ok().map(FieldValue::Int),
            Self::Float => raw.parse::<f64>().ok().map(FieldValue::Float),
            Self::Text => Some(FieldValue::Text(raw.to_string())),
            Self::Key => Uuid::parse_str(raw).ok().map(FieldValue::Key),
        }
    }
}

impl FieldValue {
    /// Orders two values of the same kind. Mixed kinds and nulls are
    /// unordered, except that ints and floats compare numerically.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Key(a), Self::Key(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        Self::Key(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Reflection-style access to an element's public fields.
pub trait FieldAccess {
    /// Public field names and their kinds.
    fn field_kinds() -> &'static [(&'static str, FieldKind)]
    where
        Self: Sized;

    /// Reads a field by its public name.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Kind of the named field, if it exists.
    fn field_kind(name: &str) -> Option<FieldKind>
    where
        Self: Sized,
    {
        Self::field_kinds()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, k)| *k)
    }
}
