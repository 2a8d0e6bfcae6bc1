//! Runtime filter expressions such as `Name==Home&Id>=5`.
//!
//! A filter string is a list of `&`-separated conditions, each of the form
//! `<Property><operator><value>`. Conditions are ANDed. Anything that does
//! not parse, names a property the element type lacks, or carries a value
//! that does not fit the property's type is dropped rather than reported.
//!
//! Parsing happens once in [`FilterExpressionCompiler::compile`]. Binding to
//! an element type ([`CompiledFilter::bind`]) resolves property kinds and
//! parses constants once per type, not per element.

use arbor_model::{FieldAccess, FieldValue};
use std::cmp::Ordering;
use std::marker::PhantomData;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
}

/// Operator tokens, two-character ones first so `>=` is never read as `>`.
const TOKENS: [(&str, Operator); 8] = [
    ("==", Operator::Equals),
    ("!=", Operator::NotEquals),
    ("<>", Operator::NotEquals),
    (">=", Operator::GreaterOrEqual),
    ("<=", Operator::LessOrEqual),
    ("=", Operator::Equals),
    (">", Operator::GreaterThan),
    ("<", Operator::LessThan),
];

impl Operator {
    /// Reads the longest operator token starting at the beginning of `s`.
    fn read(s: &str) -> Option<(Operator, usize)> {
        TOKENS
            .iter()
            .find(|(token, _)| s.starts_with(token))
            .map(|(token, op)| (*op, token.len()))
    }

    fn holds(&self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (Self::Equals, o) => o == Some(Ordering::Equal),
            (Self::NotEquals, o) => o != Some(Ordering::Equal),
            (Self::GreaterThan, o) => o == Some(Ordering::Greater),
            (Self::LessThan, o) => o == Some(Ordering::Less),
            (Self::GreaterOrEqual, o) => matches!(o, Some(Ordering::Greater | Ordering::Equal)),
            (Self::LessOrEqual, o) => matches!(o, Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

/// One parsed `(property, operator, constant)` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub property: String,
    pub operator: Operator,
    /// The constant as written, before typing.
    pub value: String,
}

impl Condition {
    /// Parses one segment. The segment is split at its first operator;
    /// everything after it is the value. Both sides must be non-empty.
    pub fn parse(segment: &str) -> Option<Self> {
        let (index, operator, len) = segment
            .char_indices()
            .find_map(|(i, _)| Operator::read(&segment[i..]).map(|(op, len)| (i, op, len)))?;
        let property = segment[..index].trim();
        let value = segment[index + len..].trim();
        if property.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self {
            property: property.to_string(),
            operator,
            value: value.to_string(),
        })
    }
}

/// A parsed filter, not yet tied to an element type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilter {
    conditions: Vec<Condition>,
}

impl CompiledFilter {
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// True when no condition survived parsing; such a filter matches
    /// everything.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Resolves the conditions against `T`'s fields.
    pub fn bind<T: FieldAccess>(&self) -> TypedFilter<T> {
        let clauses = self
            .conditions
            .iter()
            .filter_map(|c| {
                let Some(kind) = T::field_kind(&c.property) else {
                    debug!("Dropping filter on unknown property '{}'", c.property);
                    return None;
                };
                let Some(constant) = kind.parse_constant(&c.value) else {
                    debug!("Dropping filter '{}': '{}' is not a {:?}", c.property, c.value, kind);
                    return None;
                };
                Some(Clause {
                    property: c.property.clone(),
                    operator: c.operator,
                    constant,
                })
            })
            .collect();
        TypedFilter {
            clauses,
            _element: PhantomData,
        }
    }

    /// Whether `item` satisfies every applicable condition.
    pub fn matches<T: FieldAccess>(&self, item: &T) -> bool {
        self.bind::<T>().matches(item)
    }

    /// Keeps the items satisfying every applicable condition.
    pub fn apply<T: FieldAccess>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let filter = self.bind::<T>();
        items.into_iter().filter(|item| filter.matches(item)).collect()
    }
}

#[derive(Debug, Clone)]
struct Clause {
    property: String,
    operator: Operator,
    constant: FieldValue,
}

/// A filter bound to element type `T`.
#[derive(Debug, Clone)]
pub struct TypedFilter<T> {
    clauses: Vec<Clause>,
    _element: PhantomData<fn(&T)>,
}

impl<T: FieldAccess> TypedFilter<T> {
    /// Number of conditions that apply to `T`.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, item: &T) -> bool {
        self.clauses.iter().all(|clause| {
            let value = item.field(&clause.property).unwrap_or(FieldValue::Null);
            clause.operator.holds(value.compare(&clause.constant))
        })
    }
}

/// Parses filter strings.
pub struct FilterExpressionCompiler;

impl FilterExpressionCompiler {
    /// Parses `filter` into its surviving conditions. Blank input yields an
    /// empty filter.
    pub fn compile(filter: &str) -> CompiledFilter {
        let conditions = filter
            .split('&')
            .filter(|s| !s.trim().is_empty())
            .filter_map(|segment| {
                let parsed = Condition::parse(segment);
                if parsed.is_none() {
                    debug!("Dropping malformed filter segment '{}'", segment);
                }
                parsed
            })
            .collect();
        CompiledFilter { conditions }
    }

    /// Compiles `filter` and applies it to `items`.
    pub fn apply<T: FieldAccess>(items: impl IntoIterator<Item = T>, filter: &str) -> Vec<T> {
        Self::compile(filter).apply(items)
    }
}
