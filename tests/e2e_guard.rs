//! End-to-end tests for guarded mutation, orphan sweeps and cache validity.

use kinship::{
    EdgeId, Error, ExtendedKind, FamilyTree, LoadWarning, Person, PersonId, RelationEdge,
    RelationshipKind,
};
use pretty_assertions::assert_eq;

fn id(s: &str) -> PersonId {
    PersonId::from(s)
}

fn tree(ids: &[&str], edges: Vec<RelationEdge>) -> FamilyTree {
    let people = ids.iter().map(|i| Person::new(*i, i.to_uppercase()));
    let (tree, warnings) = FamilyTree::load(people, edges);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    tree
}

// ============================================================================
// 1. Edge insertion
// ============================================================================

#[test]
fn test_add_edge_rejections_leave_tree_unchanged() {
    let mut t = tree(
        &["gp", "p", "c", "x"],
        vec![RelationEdge::parent("e1", "gp", "p"), RelationEdge::parent("e2", "p", "c")],
    );
    let version = t.version();

    let cases = [
        (RelationEdge::parent("n1", "c", "gp"), "cycle"),
        (RelationEdge::parent("n2", "gp", "p"), "duplicate parent"),
        (RelationEdge::spouse("e1", "p", "x"), "duplicate id"),
        (RelationEdge::sibling("n3", "x", "nobody"), "unknown person"),
        (RelationEdge::spouse("n4", "x", "x"), "self reference"),
    ];
    for (edge, what) in cases {
        let result = t.add_edge(edge);
        let expected = match what {
            "cycle" => matches!(result, Err(Error::Cycle { .. })),
            "duplicate parent" => matches!(result, Err(Error::DuplicateParent { .. })),
            "duplicate id" => matches!(result, Err(Error::DuplicateEdgeId(_))),
            "unknown person" => matches!(result, Err(Error::UnknownPerson(_))),
            _ => matches!(result, Err(Error::SelfReference(_))),
        };
        assert!(expected, "{what}: {result:?}");
    }

    assert_eq!(t.version(), version);
    assert_eq!(t.graph().edge_count(), 2);
}

#[test]
fn test_added_edges_show_up_in_queries() {
    let mut t = tree(&["mom", "kid", "newborn"], vec![RelationEdge::parent("e1", "mom", "kid")]);
    assert_eq!(t.relationship(&id("kid"), &id("newborn")).unwrap(), None);

    t.add_edge(RelationEdge::parent("e2", "mom", "newborn")).unwrap();
    let record = t.relationship(&id("kid"), &id("newborn")).unwrap().unwrap();
    assert_eq!(record.kind, RelationshipKind::Sibling { half: true });
    assert_eq!(record.label, "Half-Sibling");
    assert_eq!(record.confidence, 0.9);

    assert!(t.check_parent_edge(&id("newborn"), &id("mom")).is_err());
    assert!(matches!(
        t.check_parent_edge(&id("kid"), &id("kid")),
        Err(Error::Cycle { .. })
    ));
}

// ============================================================================
// 2. Removal and orphan sweep
// ============================================================================

#[test]
fn test_remove_person_sweeps_edges() {
    let mut t = tree(
        &["a", "b", "c"],
        vec![
            RelationEdge::parent("e1", "a", "b"),
            RelationEdge::spouse("s1", "a", "c"),
            RelationEdge::parent("e2", "c", "b"),
        ],
    );

    let swept = t.remove_person(&id("a")).unwrap();
    let swept_ids: Vec<&EdgeId> = swept.iter().map(|e| &e.id).collect();
    assert_eq!(swept_ids, vec![&EdgeId::from("e1"), &EdgeId::from("s1")]);

    assert_eq!(t.graph().edge_count(), 1);
    assert_eq!(t.graph().parents_of(&id("b")), &[id("c")]);
    assert!(matches!(t.relationships_for(&id("a")), Err(Error::UnknownPerson(_))));
    assert!(matches!(t.remove_person(&id("a")), Err(Error::UnknownPerson(_))));
}

#[test]
fn test_remove_edge_reports_removed_edge() {
    let mut t = tree(&["a", "b"], vec![RelationEdge::parent("e1", "a", "b")]);

    let removal = t.remove_edge(&"e1".into()).unwrap();
    assert_eq!(removal.removed, RelationEdge::parent("e1", "a", "b"));
    assert!(removal.orphans.is_empty());
    assert_eq!(t.relationship(&id("a"), &id("b")).unwrap(), None);
    assert!(t.can_add_parent_edge(&id("b"), &id("a")));
}

#[test]
fn test_upsert_person_changes_labels() {
    let mut t = tree(&["a", "b"], vec![RelationEdge::parent("e1", "a", "b")]);
    assert_eq!(t.relationship(&id("a"), &id("b")).unwrap().unwrap().label, "Parent");

    let previous = t.upsert_person(Person::new("a", "Ada").with_gender(kinship::Gender::Female));
    assert_eq!(previous.map(|p| p.name), Some("A".to_string()));
    assert_eq!(t.relationship(&id("a"), &id("b")).unwrap().unwrap().label, "Mother");
}

// ============================================================================
// 3. Conflicts
// ============================================================================

#[test]
fn test_conflicts_follow_mutations() {
    let mut t = tree(
        &["gm", "mom", "kid"],
        vec![
            RelationEdge::parent("e1", "gm", "mom"),
            RelationEdge::explicit("x1", "gm", "kid", ExtendedKind::Grandparent),
        ],
    );
    // No structural path yet, nothing to contradict.
    assert!(t.detect_conflicts().is_empty());

    t.add_edge(RelationEdge::parent("e2", "mom", "kid")).unwrap();
    assert!(t.detect_conflicts().is_empty());

    t.add_edge(RelationEdge::explicit("x2", "mom", "kid", ExtendedKind::AuntUncle)).unwrap();
    let conflicts = t.detect_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].edge_id, EdgeId::from("x2"));
    assert_eq!(conflicts[0].inferred, RelationshipKind::Parent);

    t.remove_edge(&"x2".into()).unwrap();
    assert!(t.detect_conflicts().is_empty());
}

#[test]
fn test_explicit_step_parent_agrees_with_inference() {
    let t = tree(
        &["mom", "step", "kid"],
        vec![
            RelationEdge::parent("e1", "mom", "kid"),
            RelationEdge::spouse("s1", "mom", "step"),
            RelationEdge::explicit("x1", "step", "kid", ExtendedKind::StepParent),
        ],
    );
    assert!(t.detect_conflicts().is_empty());

    let record = t.relationship(&id("step"), &id("kid")).unwrap().unwrap();
    assert_eq!(record.kind, RelationshipKind::Explicit(ExtendedKind::StepParent));
    assert!(record.secondary.is_empty());
}

#[test]
fn test_explicit_labels_on_relatives_by_marriage() {
    let mut t = tree(
        &["gp", "mom", "unc", "wife", "cuz", "cuzhus", "kid"],
        vec![
            RelationEdge::parent("e1", "gp", "mom"),
            RelationEdge::parent("e2", "gp", "unc"),
            RelationEdge::parent("e3", "mom", "kid"),
            RelationEdge::parent("e4", "unc", "cuz"),
            RelationEdge::spouse("s1", "unc", "wife"),
            RelationEdge::spouse("s2", "cuz", "cuzhus"),
            RelationEdge::explicit("x1", "wife", "kid", ExtendedKind::AuntUncle),
            RelationEdge::explicit("x2", "cuzhus", "kid", ExtendedKind::Cousin),
        ],
    );
    assert!(t.detect_conflicts().is_empty());

    let record = t.relationship(&id("wife"), &id("kid")).unwrap().unwrap();
    assert_eq!(record.kind, RelationshipKind::Explicit(ExtendedKind::AuntUncle));
    assert!(record.secondary.is_empty());

    // A label the marriage path does not support is still reported.
    t.add_edge(RelationEdge::explicit("x3", "cuzhus", "mom", ExtendedKind::Sibling)).unwrap();
    let conflicts = t.detect_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].edge_id, EdgeId::from("x3"));
    assert_eq!(
        conflicts[0].inferred,
        RelationshipKind::InLaw(Box::new(RelationshipKind::NieceNephew { greats: 0 }))
    );
}

// ============================================================================
// 4. Load warnings and cache
// ============================================================================

#[test]
fn test_load_warnings_are_typed() {
    let people = ["a", "b"].map(|i| Person::new(i, i));
    let (t, warnings) = FamilyTree::load(
        people,
        vec![
            RelationEdge::parent("e1", "a", "b"),
            RelationEdge::parent("e2", "b", "a"),
            RelationEdge::parent("e3", "a", "missing"),
        ],
    );

    assert_eq!(
        warnings,
        vec![
            LoadWarning::ParentCycle { edge_id: "e2".into(), parent: id("b"), child: id("a") },
            LoadWarning::DanglingEdge { edge_id: "e3".into(), missing: vec![id("missing")] },
        ]
    );
    assert_eq!(t.graph().edge_count(), 1);
}

#[test]
fn test_cache_reused_until_mutation() {
    let mut t = tree(&["a", "b", "c"], vec![RelationEdge::parent("e1", "a", "b")]);

    t.ancestors_of(&id("b")).unwrap();
    t.ancestors_of(&id("b")).unwrap();
    let stats = t.cache_stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));

    t.add_edge(RelationEdge::parent("e2", "c", "b")).unwrap();
    assert_eq!(t.ancestors_of(&id("b")).unwrap().len(), 2);
    assert_eq!(t.cache_stats().misses, 3);
}
