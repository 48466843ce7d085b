//! Indexed family graph.
//!
//! `FamilyGraph` stores people by id and edges in an arena, with adjacency
//! indices precomputed for every lookup the traversal and deriver need.
//! It owns the version counter that invalidates the traversal cache.
//!
//! ## Validation
//!
//! Loading never fails. Edges that would break an invariant (dangling
//! endpoints, self references, repeated ids, duplicate or cycle-closing
//! parent links) are dropped and reported as `LoadWarning`s, so every
//! loaded graph has an acyclic parent subgraph.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::model::*;
use crate::traversal;
use crate::Error;

// ============================================================================
// Load warnings
// ============================================================================

/// Non-fatal problem found while loading a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadWarning {
    #[error("edge {edge_id} references missing person(s) {}", join_ids(.missing))]
    DanglingEdge { edge_id: EdgeId, missing: Vec<PersonId> },

    #[error("edge {edge_id} connects {person} to themselves")]
    SelfReference { edge_id: EdgeId, person: PersonId },

    #[error("edge id {edge_id} is used more than once")]
    DuplicateEdgeId { edge_id: EdgeId },

    #[error("person id {person} is used more than once, keeping the first")]
    DuplicatePerson { person: PersonId },

    #[error("edge {edge_id} repeats the parent link {parent} -> {child}")]
    DuplicateParent { edge_id: EdgeId, parent: PersonId, child: PersonId },

    #[error("edge {edge_id} would make {child} an ancestor of {parent} and close a cycle")]
    ParentCycle { edge_id: EdgeId, parent: PersonId, child: PersonId },

    #[error("edge {edge_id} repeats the explicit label for {from} -> {to}, the first one is used")]
    DuplicateExplicit { edge_id: EdgeId, from: PersonId, to: PersonId },

    #[error("edge {edge_id} rejected: {reason}")]
    Rejected { edge_id: EdgeId, reason: String },
}

impl LoadWarning {
    /// Whether the offending edge was left out of the graph.
    pub fn edge_dropped(&self) -> bool {
        !matches!(self, Self::DuplicatePerson { .. } | Self::DuplicateExplicit { .. })
    }

    fn from_rejection(edge: &RelationEdge, err: Error) -> Self {
        let edge_id = edge.id.clone();
        match err {
            Error::SelfReference(_) => Self::SelfReference { edge_id, person: edge.from.clone() },
            Error::DuplicateEdgeId(_) => Self::DuplicateEdgeId { edge_id },
            Error::DuplicateParent { parent, child } => Self::DuplicateParent { edge_id, parent, child },
            Error::Cycle { parent, child } => Self::ParentCycle { edge_id, parent, child },
            Error::UnknownPerson(id) => Self::DanglingEdge { edge_id, missing: vec![id] },
            other => Self::Rejected { edge_id, reason: other.to_string() },
        }
    }
}

fn join_ids(ids: &[PersonId]) -> String {
    ids.iter().map(PersonId::as_str).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// FamilyGraph
// ============================================================================

type Adjacency = SmallVec<[PersonId; 2]>;
type EdgeSlots = SmallVec<[usize; 2]>;

/// People plus relation edges, with adjacency indices.
#[derive(Debug, Default)]
pub struct FamilyGraph {
    people: HashMap<PersonId, Person>,
    /// Edge arena; indices below address it by slot.
    edges: Vec<RelationEdge>,
    edge_slots: HashMap<EdgeId, usize>,
    parents: HashMap<PersonId, Adjacency>,
    children: HashMap<PersonId, Adjacency>,
    siblings: HashMap<PersonId, Adjacency>,
    /// Spouse edges touching a person, both directions.
    spouses: HashMap<PersonId, EdgeSlots>,
    /// Explicit edges touching a person, both directions, arena order.
    explicit: HashMap<PersonId, EdgeSlots>,
    version: u64,
}

impl FamilyGraph {
    /// Builds the graph and its indices in one pass over people and edges.
    pub(crate) fn load(
        people: impl IntoIterator<Item = Person>,
        edges: impl IntoIterator<Item = RelationEdge>,
    ) -> (Self, Vec<LoadWarning>) {
        let mut graph = Self::default();
        let mut warnings = Vec::new();

        for person in people {
            if graph.people.contains_key(&person.id) {
                warnings.push(LoadWarning::DuplicatePerson { person: person.id });
                continue;
            }
            graph.people.insert(person.id.clone(), person);
        }

        for edge in edges {
            match graph.admit(&edge) {
                Ok(()) => {
                    if let Some(warning) = graph.repeated_explicit(&edge) {
                        warnings.push(warning);
                    }
                    graph.index_edge(edge);
                }
                Err(warning) => warnings.push(warning),
            }
        }

        for warning in &warnings {
            tracing::warn!("load: {}", warning);
        }
        tracing::debug!(
            people = graph.people.len(),
            edges = graph.edges.len(),
            warnings = warnings.len(),
            "family graph loaded"
        );

        (graph, warnings)
    }

    fn admit(&self, edge: &RelationEdge) -> std::result::Result<(), LoadWarning> {
        let mut missing: Vec<PersonId> = [&edge.from, &edge.to]
            .into_iter()
            .filter(|id| !self.people.contains_key(*id))
            .cloned()
            .collect();
        missing.dedup();
        if !missing.is_empty() {
            return Err(LoadWarning::DanglingEdge { edge_id: edge.id.clone(), missing });
        }

        crate::guard::validate_edge(self, edge, |id| Arc::new(traversal::ancestors(self, id)))
            .map_err(|err| LoadWarning::from_rejection(edge, err))
    }

    fn repeated_explicit(&self, edge: &RelationEdge) -> Option<LoadWarning> {
        let EdgeKind::ExplicitExtended { .. } = edge.kind else {
            return None;
        };
        self.explicit_edges_of(&edge.from)
            .any(|e| e.from == edge.from && e.to == edge.to)
            .then(|| LoadWarning::DuplicateExplicit {
                edge_id: edge.id.clone(),
                from: edge.from.clone(),
                to: edge.to.clone(),
            })
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Monotonic counter bumped by every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.people.get(id)
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.people.contains_key(id)
    }

    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    /// Person ids in ascending order.
    pub fn person_ids(&self) -> Vec<&PersonId> {
        let mut ids: Vec<&PersonId> = self.people.keys().collect();
        ids.sort();
        ids
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &RelationEdge> {
        self.edges.iter()
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&RelationEdge> {
        self.edge_slots.get(id).map(|&slot| &self.edges[slot])
    }

    pub fn parents_of(&self, id: &PersonId) -> &[PersonId] {
        self.parents.get(id).map_or(&[], |v| v.as_slice())
    }

    pub fn children_of(&self, id: &PersonId) -> &[PersonId] {
        self.children.get(id).map_or(&[], |v| v.as_slice())
    }

    /// Recorded sibling links, not siblings through shared parents.
    pub fn siblings_of(&self, id: &PersonId) -> &[PersonId] {
        self.siblings.get(id).map_or(&[], |v| v.as_slice())
    }

    /// Spouse edges touching `id`.
    pub fn spouse_edges_of<'a>(&'a self, id: &PersonId) -> impl Iterator<Item = &'a RelationEdge> + use<'a> {
        self.slots(&self.spouses, id)
    }

    /// The other endpoint of every spouse edge, once per person.
    pub fn spouses_of(&self, id: &PersonId) -> Vec<&PersonId> {
        let mut out: Vec<&PersonId> = Vec::new();
        for edge in self.spouse_edges_of(id) {
            if let Some(other) = edge.other(id) {
                if !out.contains(&other) {
                    out.push(other);
                }
            }
        }
        out
    }

    /// Explicit edges touching `id`, in arena order.
    pub fn explicit_edges_of<'a>(&'a self, id: &PersonId) -> impl Iterator<Item = &'a RelationEdge> + use<'a> {
        self.slots(&self.explicit, id)
    }

    fn slots<'a>(
        &'a self,
        index: &'a HashMap<PersonId, EdgeSlots>,
        id: &PersonId,
    ) -> impl Iterator<Item = &'a RelationEdge> + use<'a> {
        index
            .get(id)
            .into_iter()
            .flat_map(|slots| slots.iter())
            .map(|&slot| &self.edges[slot])
    }

    pub fn is_parent_of(&self, parent: &PersonId, child: &PersonId) -> bool {
        self.parents_of(child).contains(parent)
    }

    // ========================================================================
    // Mutation (only reachable through the guard)
    // ========================================================================

    /// Appends an already validated edge.
    pub(crate) fn insert_edge(&mut self, edge: RelationEdge) {
        self.index_edge(edge);
        self.version += 1;
    }

    pub(crate) fn remove_edge(&mut self, id: &EdgeId) -> Option<RelationEdge> {
        let slot = self.edge_slots.get(id).copied()?;
        let removed = self.edges.remove(slot);
        self.reindex();
        self.version += 1;
        Some(removed)
    }

    pub(crate) fn upsert_person(&mut self, person: Person) -> Option<Person> {
        self.version += 1;
        self.people.insert(person.id.clone(), person)
    }

    pub(crate) fn remove_person(&mut self, id: &PersonId) -> Option<Person> {
        let removed = self.people.remove(id)?;
        self.version += 1;
        Some(removed)
    }

    /// Drops every edge with an endpoint that no longer resolves.
    pub(crate) fn sweep_orphans(&mut self) -> Vec<RelationEdge> {
        let (kept, orphans): (Vec<_>, Vec<_>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| self.people.contains_key(&e.from) && self.people.contains_key(&e.to));
        self.edges = kept;
        if !orphans.is_empty() {
            self.reindex();
            self.version += 1;
        }
        orphans
    }

    fn reindex(&mut self) {
        let edges = std::mem::take(&mut self.edges);
        self.edge_slots.clear();
        self.parents.clear();
        self.children.clear();
        self.siblings.clear();
        self.spouses.clear();
        self.explicit.clear();
        for edge in edges {
            self.index_edge(edge);
        }
    }

    fn index_edge(&mut self, edge: RelationEdge) {
        let slot = self.edges.len();
        match &edge.kind {
            EdgeKind::Parent => {
                self.parents.entry(edge.to.clone()).or_default().push(edge.from.clone());
                self.children.entry(edge.from.clone()).or_default().push(edge.to.clone());
            }
            EdgeKind::Sibling => {
                push_unique(self.siblings.entry(edge.from.clone()).or_default(), &edge.to);
                push_unique(self.siblings.entry(edge.to.clone()).or_default(), &edge.from);
            }
            EdgeKind::Spouse { .. } => {
                self.spouses.entry(edge.from.clone()).or_default().push(slot);
                self.spouses.entry(edge.to.clone()).or_default().push(slot);
            }
            EdgeKind::ExplicitExtended { .. } => {
                self.explicit.entry(edge.from.clone()).or_default().push(slot);
                self.explicit.entry(edge.to.clone()).or_default().push(slot);
            }
        }
        self.edge_slots.insert(edge.id.clone(), slot);
        self.edges.push(edge);
    }
}

fn push_unique(list: &mut Adjacency, id: &PersonId) {
    if !list.contains(id) {
        list.push(id.clone());
    }
}

// ============================================================================
// Tests
// ============================================================================
