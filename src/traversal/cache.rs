//! Version-tagged memo cache for traversal results.
//!
//! Entries are tagged with the graph version they were computed against.
//! A mutation bumps the version; the next query that sees a mismatch
//! clears the stale entries before filling in fresh ones. Nothing is
//! recomputed eagerly.
//!
//! Reads take the shared lock only. A miss computes outside any lock and
//! then takes the write lock briefly to publish the result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use super::{DistanceMap, Direction};
use crate::graph::FamilyGraph;
use crate::model::PersonId;

/// Hit/miss counters, mostly for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
struct CacheState {
    version: u64,
    ancestors: HashMap<PersonId, Arc<DistanceMap>>,
    descendants: HashMap<PersonId, Arc<DistanceMap>>,
    generations: Option<(bool, Arc<HashMap<PersonId, i32>>)>,
}

impl CacheState {
    fn sync(&mut self, version: u64) {
        if self.version != version {
            self.version = version;
            self.ancestors.clear();
            self.descendants.clear();
            self.generations = None;
        }
    }

    fn map(&self, direction: Direction) -> &HashMap<PersonId, Arc<DistanceMap>> {
        match direction {
            Direction::Up => &self.ancestors,
            Direction::Down => &self.descendants,
        }
    }

    fn map_mut(&mut self, direction: Direction) -> &mut HashMap<PersonId, Arc<DistanceMap>> {
        match direction {
            Direction::Up => &mut self.ancestors,
            Direction::Down => &mut self.descendants,
        }
    }
}

/// Shared memo of distance maps and generation levels.
#[derive(Default)]
pub struct TraversalCache {
    state: RwLock<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for TraversalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("TraversalCache")
            .field("version", &state.version)
            .field("ancestors", &state.ancestors.len())
            .field("descendants", &state.descendants.len())
            .field("stats", &self.stats())
            .finish()
    }
}

impl TraversalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ancestors(&self, graph: &FamilyGraph, id: &PersonId) -> Arc<DistanceMap> {
        self.distances(graph, id, Direction::Up)
    }

    pub fn descendants(&self, graph: &FamilyGraph, id: &PersonId) -> Arc<DistanceMap> {
        self.distances(graph, id, Direction::Down)
    }

    fn distances(&self, graph: &FamilyGraph, id: &PersonId, direction: Direction) -> Arc<DistanceMap> {
        let version = graph.version();
        {
            let state = self.state.read();
            if state.version == version {
                if let Some(hit) = state.map(direction).get(id) {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Arc::clone(hit);
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(person = %id, ?direction, version, "traversal cache miss");
        let computed = Arc::new(super::bfs(graph, id, direction));

        let mut state = self.state.write();
        state.sync(version);
        Arc::clone(state.map_mut(direction).entry(id.clone()).or_insert(computed))
    }

    /// Generation levels for the current graph version.
    pub fn generation_levels(&self, graph: &FamilyGraph, align_spouses: bool) -> Arc<HashMap<PersonId, i32>> {
        let version = graph.version();
        {
            let state = self.state.read();
            if let (true, Some((aligned, levels))) = (state.version == version, &state.generations) {
                if *aligned == align_spouses {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Arc::clone(levels);
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = Arc::new(super::generation_levels(graph, align_spouses));

        let mut state = self.state.write();
        state.sync(version);
        state.generations = Some((align_spouses, Arc::clone(&computed)));
        computed
    }

    /// Whether every cached entry belongs to `version`.
    pub fn is_clean(&self, version: u64) -> bool {
        self.state.read().version == version
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
