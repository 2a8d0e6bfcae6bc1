use arbor_types::{NodeId, NodePath};
use proptest::prelude::*;

fn path(s: &str) -> NodePath {
    NodePath::parse(s).unwrap()
}

// ── Parsing ───────────────────────────────────────────────────────

#[test]
fn parse_valid_path() {
    let p = path("-1,1051,1062");
    assert_eq!(
        p.ids(),
        &[NodeId::ROOT, NodeId::new(1051), NodeId::new(1062)]
    );
    assert_eq!(p.node_id(), NodeId::new(1062));
    assert_eq!(p.parent_id(), Some(NodeId::new(1051)));
    assert_eq!(p.level(), 2);
}

#[test]
fn parse_rejects_non_numeric_segment() {
    assert!(NodePath::parse("-1,abc").is_err());
}

#[test]
fn parse_rejects_missing_root() {
    assert!(NodePath::parse("1051,1062").is_err());
}

#[test]
fn root_path_has_no_parent() {
    let root = NodePath::root();
    assert_eq!(root.to_string(), "-1");
    assert_eq!(root.parent_id(), None);
    assert_eq!(root.level(), 0);
    assert!(root.ancestors().is_empty());
}

// ── Containment ───────────────────────────────────────────────────

#[test]
fn contains_does_not_match_numeric_prefixes() {
    let p = path("-1,120,1234");
    assert!(!p.contains(NodeId::new(12)));
    assert!(!p.contains(NodeId::new(123)));
    assert!(p.contains(NodeId::new(120)));
    assert!(p.contains(NodeId::new(1234)));
}

#[test]
fn contains_matches_root() {
    assert!(path("-1,5").contains(NodeId::ROOT));
}

// ── Rebase ────────────────────────────────────────────────────────

#[test]
fn rebase_moves_subtree_prefix() {
    let descendant = path("-1,10,12,30");
    let old = path("-1,10,12");
    let new = path("-1,40,12");
    assert_eq!(
        descendant.rebase(&old, &new).unwrap().to_string(),
        "-1,40,12,30"
    );
}

#[test]
fn rebase_outside_subtree_is_none() {
    assert!(path("-1,11").rebase(&path("-1,10"), &path("-1,20")).is_none());
}

#[test]
fn serde_as_string() {
    let p = path("-1,-20,55");
    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, "\"-1,-20,55\"");
    let back: NodePath = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
}

// ── Properties ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn child_path_ends_with_own_id_and_parent(
        ids in prop::collection::vec(1i32..100_000, 0..8),
        own in 1i32..100_000
    ) {
        let mut p = NodePath::root();
        for id in &ids {
            p = p.child(NodeId::new(*id));
        }
        let parent = p.node_id();
        let child = p.child(NodeId::new(own));
        prop_assert_eq!(child.ids()[0], NodeId::ROOT);
        prop_assert_eq!(child.node_id(), NodeId::new(own));
        prop_assert_eq!(child.parent_id(), Some(parent));
        let reparsed = NodePath::parse(&child.to_string()).unwrap();
        prop_assert_eq!(reparsed, child);
    }

    #[test]
    fn contains_agrees_with_segment_membership(
        ids in prop::collection::vec(1i32..2_000, 1..8),
        candidate in 1i32..2_000
    ) {
        let mut p = NodePath::root();
        for id in &ids {
            p = p.child(NodeId::new(*id));
        }
        prop_assert_eq!(p.contains(NodeId::new(candidate)), ids.contains(&candidate));
    }
}
