//! # kinship: Relationship Derivation over Family Graphs
//!
//! Computes human-meaningful kinship ("grandmother", "half-sister",
//! "second cousin, 1x removed", "mother-in-law") between people in an
//! editable family graph, assigns display generations, and guards every
//! edge mutation against cycles and inconsistencies.
//!
//! ## Design Principles
//!
//! 1. **Snapshot + version**: `FamilyGraph` is an indexed arena whose version
//!    counter invalidates the traversal memo lazily
//! 2. **Closed vocabularies**: edge kinds, explicit labels and derived kinds
//!    are enums, so precedence and conflict rules match exhaustively
//! 3. **Ambiguity is data**: losing candidates become secondary records,
//!    explicit/inferred mismatches become `ConflictRecord`s
//! 4. **Guarded writes**: edges only enter the graph through the guard
//!
//! ## Quick Start
//!
//! ```rust
//! use kinship::{FamilyTree, Person, RelationEdge, RelationshipKind};
//!
//! let people = vec![
//!     Person::new("a1", "Alice"),
//!     Person::new("a2", "Bob"),
//!     Person::new("a3", "Carol"),
//! ];
//! let edges = vec![
//!     RelationEdge::spouse("s1", "a1", "a2"),
//!     RelationEdge::parent("p1", "a1", "a3"),
//!     RelationEdge::parent("p2", "a2", "a3"),
//! ];
//! let (tree, warnings) = FamilyTree::load(people, edges);
//! assert!(warnings.is_empty());
//!
//! // What a1 is to a3.
//! let record = tree.relationship(&"a1".into(), &"a3".into())?.unwrap();
//! assert_eq!(record.kind, RelationshipKind::Parent);
//! assert!(!tree.can_add_parent_edge(&"a3".into(), &"a1".into()));
//! # Ok::<(), kinship::Error>(())
//! ```
//!
//! ## Modules
//!
//! | Module | Role |
//! |--------|------|
//! | `model` | People, edges, derived records |
//! | `graph` | Indexed snapshot, load warnings |
//! | `traversal` | Ancestor/descendant BFS, generation levels, memo cache |
//! | `derive` | Relationship layers and labels |
//! | `guard` | Edge validation, cycle checks, conflict detection |

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod derive;
pub mod graph;
pub mod guard;
pub mod model;
pub mod traversal;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::KinshipConfig;
pub use graph::{FamilyGraph, LoadWarning};
pub use model::{
    ConflictRecord, EdgeId, EdgeKind, ExtendedKind, Gender, PathKind, Person, PersonId, RelationEdge,
    RelationshipKind, RelationshipRecord,
};
pub use traversal::{CacheStats, DistanceMap, TraversalCache};

use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashMap;
use serde::Serialize;

use derive::Deriver;

// ============================================================================
// Top-level FamilyTree handle
// ============================================================================

/// The primary entry point: a family graph plus its traversal memo.
///
/// Queries take `&self` and may run concurrently; mutations take
/// `&mut self` and bump the graph version.
#[derive(Debug)]
pub struct FamilyTree {
    graph: FamilyGraph,
    cache: TraversalCache,
    config: KinshipConfig,
}

/// Result of `FamilyTree::remove_edge`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRemoval {
    pub removed: RelationEdge,
    /// Edges dropped by the orphan sweep that followed.
    pub orphans: Vec<RelationEdge>,
}

impl FamilyTree {
    /// Builds a tree from a snapshot. Invalid edges are dropped and reported.
    pub fn load(
        people: impl IntoIterator<Item = Person>,
        edges: impl IntoIterator<Item = RelationEdge>,
    ) -> (Self, Vec<LoadWarning>) {
        let (graph, warnings) = FamilyGraph::load(people, edges);
        let tree = Self { graph, cache: TraversalCache::new(), config: KinshipConfig::default() };
        (tree, warnings)
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(mut self, config: KinshipConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn graph(&self) -> &FamilyGraph {
        &self.graph
    }

    pub fn config(&self) -> &KinshipConfig {
        &self.config
    }

    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.graph.person(id)
    }

    pub fn version(&self) -> u64 {
        self.graph.version()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn require(&self, id: &PersonId) -> Result<()> {
        if self.graph.contains(id) { Ok(()) } else { Err(Error::UnknownPerson(id.clone())) }
    }

    fn deriver(&self) -> Deriver<'_> {
        Deriver::new(&self.graph, &self.cache, &self.config)
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    pub fn ancestors_of(&self, id: &PersonId) -> Result<Arc<DistanceMap>> {
        self.require(id)?;
        Ok(self.cache.ancestors(&self.graph, id))
    }

    pub fn descendants_of(&self, id: &PersonId) -> Result<Arc<DistanceMap>> {
        self.require(id)?;
        Ok(self.cache.descendants(&self.graph, id))
    }

    /// Display generation of every person.
    pub fn generation_levels(&self) -> Arc<HashMap<PersonId, i32>> {
        self.cache.generation_levels(&self.graph, self.config.align_spouse_generations)
    }

    /// People per generation, ordered by birth date then id.
    pub fn generation_groups(&self) -> BTreeMap<i32, Vec<PersonId>> {
        traversal::generation_groups(&self.graph, &self.generation_levels())
    }

    // ========================================================================
    // Relationships
    // ========================================================================

    /// Every relationship of `focal`, one record per target, ordered by target id.
    pub fn relationships_for(&self, focal: &PersonId) -> Result<Vec<RelationshipRecord>> {
        self.require(focal)?;
        Ok(self.deriver().relationships_for(focal))
    }

    /// What `a` is to `b`, e.g. `Grandparent` when `a` is `b`'s grandparent.
    pub fn relationship(&self, a: &PersonId, b: &PersonId) -> Result<Option<RelationshipRecord>> {
        self.require(a)?;
        self.require(b)?;
        if a == b {
            return Ok(None);
        }
        Ok(self.deriver().relationships_for(b).into_iter().find(|r| r.target_id == *a))
    }

    // ========================================================================
    // Guarded mutation
    // ========================================================================

    pub fn can_add_parent_edge(&self, parent: &PersonId, child: &PersonId) -> bool {
        self.check_parent_edge(parent, child).is_ok()
    }

    /// Like `can_add_parent_edge`, with the reason for a rejection.
    pub fn check_parent_edge(&self, parent: &PersonId, child: &PersonId) -> Result<()> {
        guard::check_parent_edge(&self.graph, parent, child, |id| self.cache.ancestors(&self.graph, id))
    }

    /// Validates and inserts an edge. The tree is unchanged on error.
    pub fn add_edge(&mut self, edge: RelationEdge) -> Result<()> {
        guard::validate_edge(&self.graph, &edge, |id| self.cache.ancestors(&self.graph, id))?;
        tracing::debug!(edge = %edge.id, kind = %edge.kind, "edge added");
        self.graph.insert_edge(edge);
        Ok(())
    }

    /// Removes an edge, then sweeps edges whose endpoints no longer resolve.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<EdgeRemoval> {
        let removed = self.graph.remove_edge(id).ok_or_else(|| Error::UnknownEdge(id.clone()))?;
        let orphans = self.sweep();
        Ok(EdgeRemoval { removed, orphans })
    }

    /// Inserts or replaces a person, returning the previous record.
    pub fn upsert_person(&mut self, person: Person) -> Option<Person> {
        self.graph.upsert_person(person)
    }

    /// Removes a person and returns the edges that referenced them.
    pub fn remove_person(&mut self, id: &PersonId) -> Result<Vec<RelationEdge>> {
        self.graph.remove_person(id).ok_or_else(|| Error::UnknownPerson(id.clone()))?;
        Ok(self.sweep())
    }

    fn sweep(&mut self) -> Vec<RelationEdge> {
        let orphans = self.graph.sweep_orphans();
        if !orphans.is_empty() {
            tracing::debug!(count = orphans.len(), "swept orphaned edges");
        }
        orphans
    }

    /// Explicit edges the graph structure contradicts.
    pub fn detect_conflicts(&self) -> Vec<ConflictRecord> {
        guard::detect_conflicts(&self.graph, &self.deriver())
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown person: {0}")]
    UnknownPerson(PersonId),

    #[error("Unknown edge: {0}")]
    UnknownEdge(EdgeId),

    #[error("adding {parent} as a parent of {child} would create a cycle")]
    Cycle { parent: PersonId, child: PersonId },

    #[error("{parent} is already a parent of {child}")]
    DuplicateParent { parent: PersonId, child: PersonId },

    #[error("Edge id already in use: {0}")]
    DuplicateEdgeId(EdgeId),

    #[error("Edge {0} connects a person to themselves")]
    SelfReference(EdgeId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
