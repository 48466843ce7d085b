//! Consistency & mutation guard.
//!
//! Every edge that enters the graph, whether at load time or through
//! `FamilyTree::add_edge`, passes `validate_edge` first. Rejections leave
//! the graph untouched. Conflict detection compares explicit edges with
//! what the structure implies for the same ordered pair.

use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::derive::{label, Deriver};
use crate::graph::FamilyGraph;
use crate::model::*;
use crate::traversal::DistanceMap;
use crate::{Error, Result};

/// Checks an edge against the graph's invariants.
///
/// In order: self reference, reused edge id, unknown endpoints, then for
/// `Parent` edges an exact duplicate or a cycle. `ancestors_of` supplies
/// unbounded ancestor maps (cached or freshly computed).
pub(crate) fn validate_edge<F>(graph: &FamilyGraph, edge: &RelationEdge, ancestors_of: F) -> Result<()>
where
    F: Fn(&PersonId) -> Arc<DistanceMap>,
{
    let verdict = check(graph, edge, ancestors_of);
    if let Err(err) = &verdict {
        tracing::debug!(edge = %edge.id, kind = %edge.kind, "edge rejected: {}", err);
    }
    verdict
}

fn check<F>(graph: &FamilyGraph, edge: &RelationEdge, ancestors_of: F) -> Result<()>
where
    F: Fn(&PersonId) -> Arc<DistanceMap>,
{
    if edge.from == edge.to {
        return Err(Error::SelfReference(edge.id.clone()));
    }
    if graph.edge(&edge.id).is_some() {
        return Err(Error::DuplicateEdgeId(edge.id.clone()));
    }
    for id in [&edge.from, &edge.to] {
        if !graph.contains(id) {
            return Err(Error::UnknownPerson(id.clone()));
        }
    }
    if edge.kind.is_parent() {
        parent_edge(graph, &edge.from, &edge.to, ancestors_of)?;
    }
    Ok(())
}

/// Whether `parent → child` may be added: both exist, the link is new and
/// `child` is neither `parent` nor one of `parent`'s ancestors.
pub(crate) fn check_parent_edge<F>(graph: &FamilyGraph, parent: &PersonId, child: &PersonId, ancestors_of: F) -> Result<()>
where
    F: Fn(&PersonId) -> Arc<DistanceMap>,
{
    for id in [parent, child] {
        if !graph.contains(id) {
            return Err(Error::UnknownPerson(id.clone()));
        }
    }
    parent_edge(graph, parent, child, ancestors_of)
}

fn parent_edge<F>(graph: &FamilyGraph, parent: &PersonId, child: &PersonId, ancestors_of: F) -> Result<()>
where
    F: Fn(&PersonId) -> Arc<DistanceMap>,
{
    if graph.is_parent_of(parent, child) {
        return Err(Error::DuplicateParent { parent: parent.clone(), child: child.clone() });
    }
    if parent == child || ancestors_of(parent).contains_key(child) {
        return Err(Error::Cycle { parent: parent.clone(), child: child.clone() });
    }
    Ok(())
}

/// Structural explicit edges whose ordered pair the graph implies differently.
///
/// Only the first explicit edge per ordered pair counts, matching what
/// direct queries report.
pub(crate) fn detect_conflicts(graph: &FamilyGraph, deriver: &Deriver<'_>) -> Vec<ConflictRecord> {
    let mut inferred_for: HashMap<&PersonId, BTreeMap<PersonId, RelationshipRecord>> = HashMap::new();
    let mut seen: HashSet<(&PersonId, &PersonId)> = HashSet::new();
    let mut conflicts = Vec::new();

    for edge in graph.edges() {
        let EdgeKind::ExplicitExtended { kind } = edge.kind else { continue };
        if !seen.insert((&edge.from, &edge.to)) || !kind.is_structural() {
            continue;
        }
        let inferred = inferred_for.entry(&edge.to).or_insert_with(|| deriver.inferred(&edge.to));
        let Some(record) = inferred.get(&edge.from) else { continue };
        if kind.agrees_with(&record.kind) {
            continue;
        }
        let gender = graph.person(&edge.from).map(Person::gender).unwrap_or_default();
        conflicts.push(ConflictRecord {
            edge_id: edge.id.clone(),
            pair: (edge.from.clone(), edge.to.clone()),
            inferred: record.kind.clone(),
            inferred_label: label::noun(&record.kind, gender),
            explicit: kind,
            explicit_label: kind.label(gender),
        });
    }

    if !conflicts.is_empty() {
        tracing::debug!(count = conflicts.len(), "explicit edges conflict with inferred relationships");
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KinshipConfig;
    use crate::traversal::{self, TraversalCache};
    use pretty_assertions::assert_eq;

    fn chain() -> FamilyGraph {
        let people = ["a", "b", "c", "d"].map(|id| Person::new(id, id));
        let edges = vec![RelationEdge::parent("p1", "a", "b"), RelationEdge::parent("p2", "b", "c")];
        FamilyGraph::load(people, edges).0
    }

    fn validate(graph: &FamilyGraph, edge: &RelationEdge) -> Result<()> {
        validate_edge(graph, edge, |id| Arc::new(traversal::ancestors(graph, id)))
    }

    #[test]
    fn test_cycle_rejected() {
        let g = chain();
        let err = validate(&g, &RelationEdge::parent("p3", "c", "a")).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
        assert_eq!(err.to_string(), "adding c as a parent of a would create a cycle");
    }

    #[test]
    fn test_duplicate_parent_and_id_rejected() {
        let g = chain();
        assert!(matches!(
            validate(&g, &RelationEdge::parent("p9", "a", "b")),
            Err(Error::DuplicateParent { .. })
        ));
        assert!(matches!(
            validate(&g, &RelationEdge::spouse("p1", "a", "d")),
            Err(Error::DuplicateEdgeId(_))
        ));
    }

    #[test]
    fn test_unknown_endpoint_and_self_reference() {
        let g = chain();
        assert!(matches!(
            validate(&g, &RelationEdge::sibling("s1", "a", "zed")),
            Err(Error::UnknownPerson(id)) if id == PersonId::from("zed")
        ));
        assert!(matches!(
            validate(&g, &RelationEdge::spouse("s1", "d", "d")),
            Err(Error::SelfReference(_))
        ));
    }

    #[test]
    fn test_valid_edges_accepted() {
        let g = chain();
        assert!(validate(&g, &RelationEdge::parent("p3", "d", "c")).is_ok());
        assert!(validate(&g, &RelationEdge::spouse("s1", "a", "d")).is_ok());
        // Non-parent edges never close a parent cycle.
        assert!(validate(&g, &RelationEdge::explicit("x1", "c", "a", ExtendedKind::Godparent)).is_ok());
    }

    #[test]
    fn test_check_parent_edge_self_is_cycle() {
        let g = chain();
        let ancestors = |id: &PersonId| Arc::new(traversal::ancestors(&g, id));
        assert!(matches!(
            check_parent_edge(&g, &"b".into(), &"b".into(), ancestors),
            Err(Error::Cycle { .. })
        ));
        assert!(check_parent_edge(&g, &"c".into(), &"d".into(), ancestors).is_ok());
    }

    #[test]
    fn test_conflicts_skip_social_and_agreeing_edges() {
        let people = ["mom", "a", "b", "c"].map(|id| Person::new(id, id).with_gender(Gender::Female));
        let edges = vec![
            RelationEdge::parent("p1", "mom", "a"),
            RelationEdge::parent("p2", "mom", "b"),
            RelationEdge::parent("p3", "a", "c"),
            RelationEdge::explicit("x1", "a", "b", ExtendedKind::Cousin),
            RelationEdge::explicit("x2", "a", "b", ExtendedKind::Sibling),
            RelationEdge::explicit("x3", "b", "a", ExtendedKind::Sibling),
            RelationEdge::explicit("x4", "mom", "c", ExtendedKind::Godparent),
            RelationEdge::explicit("x5", "b", "c", ExtendedKind::AuntUncle),
        ];
        let (graph, _) = FamilyGraph::load(people, edges);
        let cache = TraversalCache::new();
        let config = KinshipConfig::default();
        let deriver = Deriver::new(&graph, &cache, &config);

        let conflicts = detect_conflicts(&graph, &deriver);
        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!(conflict.edge_id, EdgeId::from("x1"));
        assert_eq!(conflict.pair, (PersonId::from("a"), PersonId::from("b")));
        assert_eq!(conflict.inferred, RelationshipKind::Sibling { half: true });
        assert_eq!(conflict.inferred_label, "Half-Sister");
        assert_eq!(conflict.explicit_label, "Cousin");
    }
}
