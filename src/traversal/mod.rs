//! Traversal core: ancestor/descendant distance maps and generation levels.
//!
//! All searches are breadth-first over `Parent` edges, so the first visit
//! of a person is always at its minimum distance. That makes DAG-shaped
//! pedigrees (two parents, remarriage, pedigree collapse) report each
//! relative exactly once at the shortest distance.

pub mod cache;

use std::collections::{BTreeMap, VecDeque};

use hashbrown::{HashMap, HashSet};

use crate::graph::FamilyGraph;
use crate::model::PersonId;

pub use cache::{CacheStats, TraversalCache};

/// Person → number of `Parent` edges from the focal person.
pub type DistanceMap = HashMap<PersonId, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Every ancestor of `id` with its up-distance (1 = parent).
pub fn ancestors(graph: &FamilyGraph, id: &PersonId) -> DistanceMap {
    bfs(graph, id, Direction::Up)
}

/// Every descendant of `id` with its down-distance (1 = child).
pub fn descendants(graph: &FamilyGraph, id: &PersonId) -> DistanceMap {
    bfs(graph, id, Direction::Down)
}

fn bfs(graph: &FamilyGraph, start: &PersonId, direction: Direction) -> DistanceMap {
    let mut distances = DistanceMap::new();
    let mut seen: HashSet<&PersonId> = HashSet::new();
    let mut queue: VecDeque<(&PersonId, u32)> = VecDeque::new();

    seen.insert(start);
    queue.push_back((start, 0));

    while let Some((current, depth)) = queue.pop_front() {
        let next = match direction {
            Direction::Up => graph.parents_of(current),
            Direction::Down => graph.children_of(current),
        };
        for neighbor in next {
            if seen.insert(neighbor) {
                distances.insert(neighbor.clone(), depth + 1);
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    distances
}

/// Display generation of every person.
///
/// Roots (no recorded parents) sit at level 0 and children at their
/// parent's level + 1, taking the minimum when several roots reach the
/// same person. A `generation_override` pins a person and seeds its
/// descendants. With `align_spouses`, a parentless person married to
/// someone with recorded parents takes that spouse's level instead of 0.
/// People no seed reaches default to 0.
pub fn generation_levels(graph: &FamilyGraph, align_spouses: bool) -> HashMap<PersonId, i32> {
    let mut levels: HashMap<PersonId, i32> = HashMap::new();
    let mut pinned: HashSet<PersonId> = HashSet::new();
    let mut queue: VecDeque<PersonId> = VecDeque::new();
    let mut married_in: Vec<&PersonId> = Vec::new();

    for id in graph.person_ids() {
        let Some(person) = graph.person(id) else { continue };
        if let Some(level) = person.generation_override {
            levels.insert(id.clone(), level);
            pinned.insert(id.clone());
            queue.push_back(id.clone());
        } else if graph.parents_of(id).is_empty() {
            let spouse_has_parents = graph
                .spouses_of(id)
                .into_iter()
                .any(|s| !graph.parents_of(s).is_empty());
            if align_spouses && spouse_has_parents {
                married_in.push(id);
            } else {
                levels.insert(id.clone(), 0);
                queue.push_back(id.clone());
            }
        }
    }
    relax(graph, &mut levels, &pinned, queue);

    if !married_in.is_empty() {
        let mut queue = VecDeque::new();
        for id in married_in {
            let spouse_level = graph
                .spouses_of(id)
                .into_iter()
                .filter(|s| !graph.parents_of(s).is_empty())
                .filter_map(|s| levels.get(s).copied())
                .min();
            if let Some(level) = spouse_level {
                levels.insert(id.clone(), level);
                queue.push_back(id.clone());
            }
        }
        relax(graph, &mut levels, &pinned, queue);
    }

    for id in graph.person_ids() {
        levels.entry(id.clone()).or_insert(0);
    }
    levels
}

/// Propagates `level + 1` to children until no level can be lowered.
fn relax(
    graph: &FamilyGraph,
    levels: &mut HashMap<PersonId, i32>,
    pinned: &HashSet<PersonId>,
    mut queue: VecDeque<PersonId>,
) {
    while let Some(current) = queue.pop_front() {
        let Some(&level) = levels.get(&current) else { continue };
        for child in graph.children_of(&current) {
            if pinned.contains(child) {
                continue;
            }
            let candidate = level + 1;
            match levels.get(child) {
                Some(&existing) if existing <= candidate => {}
                _ => {
                    levels.insert(child.clone(), candidate);
                    queue.push_back(child.clone());
                }
            }
        }
    }
}

/// People grouped by generation level, each group ordered by birth date
/// (unknown dates last) then id.
pub fn generation_groups(
    graph: &FamilyGraph,
    levels: &HashMap<PersonId, i32>,
) -> BTreeMap<i32, Vec<PersonId>> {
    let mut groups: BTreeMap<i32, Vec<PersonId>> = BTreeMap::new();
    for (id, &level) in levels {
        groups.entry(level).or_default().push(id.clone());
    }
    for members in groups.values_mut() {
        members.sort_by(|a, b| {
            let birth = |id: &PersonId| graph.person(id).and_then(|p| p.birth);
            match (birth(a), birth(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
            .then_with(|| a.cmp(b))
        });
    }
    groups
}

// ============================================================================
// Tests
// ============================================================================
