//! Materialised tree paths.
//!
//! A path is the comma-delimited list of ancestor ids, root first, ending
//! with the node's own id: `-1,1051,1062`. Trashed nodes are reparented
//! under a recycle-bin id: `-1,-20,1062`.

use crate::{Error, NodeId, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Ordered ancestor chain of a node, root first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<NodeId>,
}

impl NodePath {
    /// The path of the synthetic root: `-1`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            segments: vec![NodeId::ROOT],
        }
    }

    /// Parses and validates a comma-delimited path.
    ///
    /// Every segment must be numeric and the first must be the root id.
    pub fn parse(s: &str) -> Result<Self> {
        let segments = s
            .split(',')
            .map(|seg| {
                seg.trim()
                    .parse::<i32>()
                    .map(NodeId::new)
                    .map_err(|_| Error::InvalidPath(s.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        if segments.first() != Some(&NodeId::ROOT) {
            return Err(Error::InvalidPath(s.to_string()));
        }
        Ok(Self { segments })
    }

    /// Path of a direct child of this path's node.
    #[must_use]
    pub fn child(&self, id: NodeId) -> Self {
        let mut segments = self.segments.clone();
        segments.push(id);
        Self { segments }
    }

    /// All segments, root first, including the node itself.
    #[must_use]
    pub fn ids(&self) -> &[NodeId] {
        &self.segments
    }

    /// The node this path belongs to.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        // Never empty: constructed from root or a validated string.
        self.segments[self.segments.len() - 1]
    }

    /// Second-to-last segment, or `None` for the root path itself.
    #[must_use]
    pub fn parent_id(&self) -> Option<NodeId> {
        let len = self.segments.len();
        (len >= 2).then(|| self.segments[len - 2])
    }

    /// Ancestors of the node, root first, excluding the node itself.
    #[must_use]
    pub fn ancestors(&self) -> &[NodeId] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Depth below the root (root is level 0).
    #[must_use]
    pub fn level(&self) -> usize {
        self.segments.len() - 1
    }

    /// Whether `id` is one of the segments.
    ///
    /// Mirrors the delimiter-padded substring test `",{path}," ∋ ",{id},"`
    /// so that `12` never matches `123`.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        let padded = format!(",{self},");
        padded.contains(&format!(",{id},"))
    }

    /// True if `self` is `ancestor` or lies beneath it.
    #[must_use]
    pub fn starts_with(&self, ancestor: &NodePath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }

    /// Replaces the `old` prefix with `new`. Returns `None` if `self` does
    /// not start with `old`.
    #[must_use]
    pub fn rebase(&self, old: &NodePath, new: &NodePath) -> Option<Self> {
        if !self.starts_with(old) {
            return None;
        }
        let mut segments = new.segments.clone();
        segments.extend_from_slice(&self.segments[old.segments.len()..]);
        Some(Self { segments })
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
