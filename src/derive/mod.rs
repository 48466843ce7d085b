//! Relationship deriver.
//!
//! Turns distance maps into `RelationshipRecord`s for a focal person.
//! Layers are applied most specific first and an earlier layer owns a
//! target once it has claimed it:
//!
//! 1. blood: direct lineage, then collateral relatives through the
//!    nearest common ancestors (and through recorded sibling links),
//! 2. marriage: direct spouses (demoted to secondary if already blood),
//! 3. step: a parent's spouse, their children, a spouse's children,
//! 4. in-law: spouses of blood relatives, blood relatives of spouses,
//! 5. explicit: manually asserted edges override everything above and
//!    keep the contradicted inference as a flagged secondary record.
//!
//! Every record describes what the target is to the focal person.

pub mod label;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashSet;

use crate::config::KinshipConfig;
use crate::graph::FamilyGraph;
use crate::model::*;
use crate::traversal::{DistanceMap, TraversalCache};

/// One way of reaching a target, before labels are attached.
#[derive(Debug, Clone)]
struct Candidate {
    kind: RelationshipKind,
    confidence: f64,
    path_kind: PathKind,
    via: Option<PersonId>,
    /// Edges between focal and target along this path.
    distance: u32,
}

impl Candidate {
    fn lineal(kind: RelationshipKind, distance: u32) -> Self {
        Self { kind, confidence: 1.0, path_kind: PathKind::Blood, via: None, distance }
    }
}

/// Shorter paths first, then higher confidence, then the more direct path kind.
fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    a.distance
        .cmp(&b.distance)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.path_kind.cmp(&b.path_kind))
}

type Candidates = BTreeMap<PersonId, Vec<Candidate>>;

fn push(found: &mut Candidates, target: &PersonId, candidate: Candidate) {
    found.entry(target.clone()).or_default().push(candidate);
}

/// Distance map entries ordered by distance, then id.
fn sorted(map: &DistanceMap) -> Vec<(&PersonId, u32)> {
    let mut entries: Vec<(&PersonId, u32)> = map.iter().map(|(id, &d)| (id, d)).collect();
    entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    entries
}

fn explicit_kind(edge: &RelationEdge) -> Option<ExtendedKind> {
    match &edge.kind {
        EdgeKind::ExplicitExtended { kind } => Some(*kind),
        _ => None,
    }
}

/// Number of edges a relationship spans, used to rank derived layers.
fn separation(kind: &RelationshipKind) -> u32 {
    match kind {
        RelationshipKind::Parent | RelationshipKind::Child => 1,
        RelationshipKind::Grandparent | RelationshipKind::Grandchild => 2,
        RelationshipKind::GreatGrandparent { greats } | RelationshipKind::GreatGrandchild { greats } => {
            greats + 2
        }
        RelationshipKind::Sibling { .. } => 2,
        RelationshipKind::AuntUncle { greats } | RelationshipKind::NieceNephew { greats } => greats + 3,
        RelationshipKind::Cousin { degree, removed } => 2 * (degree + 1) + removed,
        RelationshipKind::Spouse { .. } | RelationshipKind::Explicit(_) => 1,
        RelationshipKind::StepParent | RelationshipKind::StepChild => 2,
        RelationshipKind::StepSibling => 3,
        RelationshipKind::InLaw(inner) => separation(inner) + 1,
    }
}

/// Read-only view over a graph snapshot that derives relationships.
pub(crate) struct Deriver<'a> {
    graph: &'a FamilyGraph,
    cache: &'a TraversalCache,
    config: &'a KinshipConfig,
}

impl<'a> Deriver<'a> {
    pub(crate) fn new(graph: &'a FamilyGraph, cache: &'a TraversalCache, config: &'a KinshipConfig) -> Self {
        Self { graph, cache, config }
    }

    fn ancestors(&self, id: &PersonId) -> Arc<DistanceMap> {
        self.cache.ancestors(self.graph, id)
    }

    fn descendants(&self, id: &PersonId) -> Arc<DistanceMap> {
        self.cache.descendants(self.graph, id)
    }

    /// Every relationship of `focal`, explicit edges applied, ordered by target id.
    pub(crate) fn relationships_for(&self, focal: &PersonId) -> Vec<RelationshipRecord> {
        let mut records = self.inferred(focal);
        self.apply_explicit(focal, &mut records);
        records.into_values().collect()
    }

    /// Everything the structure implies, explicit edges ignored.
    pub(crate) fn inferred(&self, focal: &PersonId) -> BTreeMap<PersonId, RelationshipRecord> {
        let mut records = BTreeMap::new();
        for (target, candidates) in self.blood(focal) {
            if let Some(record) = self.resolve(focal, &target, candidates) {
                records.insert(target, record);
            }
        }

        let spouses = self.spouse_candidates(focal);
        self.layer(focal, &mut records, spouses, true);

        let steps = self.step_candidates(focal);
        self.layer(focal, &mut records, steps, false);

        let in_laws = self.in_law_candidates(focal, &records);
        self.layer(focal, &mut records, in_laws, false);

        records
    }

    /// Adds a layer's targets that no earlier layer claimed. With `demote`,
    /// claimed targets keep the layer's record as a secondary one.
    fn layer(
        &self,
        focal: &PersonId,
        records: &mut BTreeMap<PersonId, RelationshipRecord>,
        found: Candidates,
        demote: bool,
    ) {
        for (target, candidates) in found {
            if target == *focal {
                continue;
            }
            match records.get_mut(&target) {
                Some(existing) if demote => {
                    if let Some(record) = self.resolve(focal, &target, candidates) {
                        let record = self.demote(record, existing.confidence);
                        existing.secondary.push(record);
                    }
                }
                Some(_) => {}
                None => {
                    if let Some(record) = self.resolve(focal, &target, candidates) {
                        records.insert(target, record);
                    }
                }
            }
        }
    }

    fn demote(&self, mut record: RelationshipRecord, primary_confidence: f64) -> RelationshipRecord {
        record.confidence = record.confidence.min(primary_confidence) * self.config.secondary_confidence_factor;
        record.secondary.clear();
        record
    }

    /// Best candidate becomes the record; other kinds become secondaries.
    fn resolve(
        &self,
        focal: &PersonId,
        target: &PersonId,
        mut candidates: Vec<Candidate>,
    ) -> Option<RelationshipRecord> {
        let focal_person = self.graph.person(focal)?;
        let target_person = self.graph.person(target)?;

        candidates.sort_by(rank);
        let mut iter = candidates.into_iter();
        let mut primary = self.record(target, iter.next()?, target_person, focal_person);

        let mut seen = vec![primary.kind.clone()];
        for candidate in iter {
            if seen.contains(&candidate.kind) {
                continue;
            }
            seen.push(candidate.kind.clone());
            let alternative = self.record(target, candidate, target_person, focal_person);
            let alternative = self.demote(alternative, primary.confidence);
            primary.secondary.push(alternative);
        }
        Some(primary)
    }

    fn record(&self, target: &PersonId, c: Candidate, target_person: &Person, focal_person: &Person) -> RelationshipRecord {
        let label = label::describe(&c.kind, target_person, focal_person);
        RelationshipRecord {
            target_id: target.clone(),
            kind: c.kind,
            label,
            confidence: c.confidence,
            path_kind: c.path_kind,
            via: c.via,
            secondary: Vec::new(),
            conflict: false,
        }
    }

    // ========================================================================
    // Blood
    // ========================================================================

    fn blood(&self, focal: &PersonId) -> Candidates {
        let mut found = Candidates::new();
        let ups = self.ancestors(focal);
        let downs = self.descendants(focal);
        let lineal = |id: &PersonId| id == focal || ups.contains_key(id) || downs.contains_key(id);
        let within = |d: u32| self.config.within_depth(d);

        for (ancestor, up) in sorted(&ups) {
            if within(up) {
                push(&mut found, ancestor, Candidate::lineal(RelationshipKind::ancestor(up), up));
            }
        }
        for (descendant, down) in sorted(&downs) {
            if within(down) && !ups.contains_key(descendant) {
                push(&mut found, descendant, Candidate::lineal(RelationshipKind::descendant(down), down));
            }
        }

        for (ancestor, up) in sorted(&ups) {
            if !within(up) {
                continue;
            }
            let below = self.descendants(ancestor);
            for (target, down) in sorted(&below) {
                if lineal(target) || !within(down) || !self.is_nearest_common(ancestor, &ups, target) {
                    continue;
                }
                let candidate = self.collateral(focal, target, up, down, PathKind::Blood, ancestor);
                push(&mut found, target, candidate);
            }
        }

        // A recorded sibling link counts as a shared parent one level up.
        let mut line: Vec<(&PersonId, u32)> = vec![(focal, 0)];
        line.extend(sorted(&ups).into_iter().filter(|(_, up)| within(up + 1)));
        for (member, up) in line {
            for sibling in self.graph.siblings_of(member) {
                if lineal(sibling) {
                    continue;
                }
                let below = self.descendants(sibling);
                let reach = std::iter::once((sibling, 0)).chain(sorted(&below));
                for (target, down) in reach {
                    if lineal(target) || !within(down + 1) {
                        continue;
                    }
                    let mut candidate =
                        self.collateral(focal, target, up + 1, down + 1, PathKind::Declared, member);
                    candidate.confidence = candidate.confidence.min(self.config.declared_sibling_confidence);
                    push(&mut found, target, candidate);
                }
            }
        }

        found
    }

    /// Whether `ancestor` is a lowest common ancestor of the focal person
    /// (whose ancestors are `ups`) and `target`: none of its children is
    /// also shared.
    fn is_nearest_common(&self, ancestor: &PersonId, ups: &DistanceMap, target: &PersonId) -> bool {
        !self
            .graph
            .children_of(ancestor)
            .iter()
            .any(|child| ups.contains_key(child) && self.descendants(child).contains_key(target))
    }

    fn collateral(
        &self,
        focal: &PersonId,
        target: &PersonId,
        up: u32,
        down: u32,
        path_kind: PathKind,
        via: &PersonId,
    ) -> Candidate {
        let (kind, confidence) = match (up, down) {
            (1, 1) => self.sibling(focal, target),
            (1, d) => (RelationshipKind::NieceNephew { greats: d - 2 }, 1.0),
            (u, 1) => (RelationshipKind::AuntUncle { greats: u - 2 }, 1.0),
            (u, d) => {
                let degree = u.min(d) - 1;
                let confidence = if degree >= 2 { self.config.distant_cousin_confidence } else { 1.0 };
                (RelationshipKind::Cousin { degree, removed: u.abs_diff(d) }, confidence)
            }
        };
        Candidate { kind, confidence, path_kind, via: Some(via.clone()), distance: up + down }
    }

    fn sibling(&self, focal: &PersonId, target: &PersonId) -> (RelationshipKind, f64) {
        let mine = self.graph.parents_of(focal);
        let theirs = self.graph.parents_of(target);
        let shared = mine.iter().filter(|p| theirs.contains(p)).count();
        match shared {
            0 => (RelationshipKind::Sibling { half: false }, self.config.declared_sibling_confidence),
            1 => (RelationshipKind::Sibling { half: true }, self.config.half_sibling_confidence),
            _ => (RelationshipKind::Sibling { half: false }, 1.0),
        }
    }

    // ========================================================================
    // Marriage, step, in-law
    // ========================================================================

    fn spouse_candidates(&self, focal: &PersonId) -> Candidates {
        let mut found = Candidates::new();
        let former = |edge: &RelationEdge| matches!(edge.kind, EdgeKind::Spouse { end: Some(_), .. });

        let mut edges: Vec<&RelationEdge> = self.graph.spouse_edges_of(focal).collect();
        edges.sort_by_key(|edge| former(edge));
        for edge in edges {
            let Some(other) = edge.other(focal) else { continue };
            let candidate = Candidate {
                kind: RelationshipKind::Spouse { former: former(edge) },
                confidence: 1.0,
                path_kind: PathKind::Marriage,
                via: None,
                distance: 1,
            };
            push(&mut found, other, candidate);
        }
        found
    }

    fn step_candidates(&self, focal: &PersonId) -> Candidates {
        let mut found = Candidates::new();
        let step = |kind, via: &PersonId, distance| Candidate {
            kind,
            confidence: self.config.step_confidence,
            path_kind: PathKind::Step,
            via: Some(via.clone()),
            distance,
        };

        let parents = self.graph.parents_of(focal);
        for parent in parents {
            for spouse in self.graph.spouses_of(parent) {
                if spouse == focal || parents.contains(spouse) {
                    continue;
                }
                push(&mut found, spouse, step(RelationshipKind::StepParent, parent, 2));
                for child in self.graph.children_of(spouse) {
                    if child == focal || self.graph.is_parent_of(parent, child) {
                        continue;
                    }
                    push(&mut found, child, step(RelationshipKind::StepSibling, spouse, 3));
                }
            }
        }

        for spouse in self.graph.spouses_of(focal) {
            for child in self.graph.children_of(spouse) {
                if child == focal || self.graph.is_parent_of(focal, child) {
                    continue;
                }
                push(&mut found, child, step(RelationshipKind::StepChild, spouse, 2));
            }
        }
        found
    }

    fn in_law_candidates(&self, focal: &PersonId, records: &BTreeMap<PersonId, RelationshipRecord>) -> Candidates {
        let mut found = Candidates::new();

        // Spouses of blood relatives. A parent's spouse is a step-parent.
        for (relative, record) in records {
            if !record.path_kind.is_blood() || record.kind == RelationshipKind::Parent {
                continue;
            }
            for spouse in self.graph.spouses_of(relative) {
                if spouse != focal {
                    push(&mut found, spouse, self.in_law(record.kind.clone(), relative));
                }
            }
        }

        // Blood relatives of spouses. A spouse's child is a step-child.
        for spouse in self.graph.spouses_of(focal) {
            for (relative, candidates) in self.blood(spouse) {
                if relative == *focal {
                    continue;
                }
                let Some(best) = candidates.into_iter().min_by(rank) else { continue };
                if best.kind == RelationshipKind::Child {
                    continue;
                }
                push(&mut found, &relative, self.in_law(best.kind, spouse));
            }
        }
        found
    }

    fn in_law(&self, kind: RelationshipKind, via: &PersonId) -> Candidate {
        Candidate {
            distance: separation(&kind) + 1,
            kind: RelationshipKind::InLaw(Box::new(kind)),
            confidence: self.config.in_law_confidence,
            path_kind: PathKind::InLaw,
            via: Some(via.clone()),
        }
    }

    // ========================================================================
    // Explicit
    // ========================================================================

    /// Explicit edges win over inference. Edges pointing at the focal
    /// person are read as-is, edges leaving it through their inverse;
    /// the first edge per target is used.
    fn apply_explicit(&self, focal: &PersonId, records: &mut BTreeMap<PersonId, RelationshipRecord>) {
        let edges: Vec<&RelationEdge> = self.graph.explicit_edges_of(focal).collect();
        let incoming = edges
            .iter()
            .copied()
            .filter(|e| e.to == *focal && e.from != *focal)
            .filter_map(|e| Some((&e.from, explicit_kind(e)?)));
        let outgoing = edges
            .iter()
            .copied()
            .filter(|e| e.from == *focal)
            .filter_map(|e| Some((&e.to, explicit_kind(e)?.inverse())));

        let mut seen: HashSet<&PersonId> = HashSet::new();
        for (target, kind) in incoming.chain(outgoing) {
            if !seen.insert(target) {
                continue;
            }
            let Some(person) = self.graph.person(target) else { continue };
            let mut record = RelationshipRecord {
                target_id: target.clone(),
                kind: RelationshipKind::Explicit(kind),
                label: kind.label(person.gender()),
                confidence: 1.0,
                path_kind: PathKind::Explicit,
                via: None,
                secondary: Vec::new(),
                conflict: false,
            };
            if let Some(mut inferred) = records.remove(target) {
                if !kind.is_structural() {
                    record.secondary.push(inferred);
                } else if !kind.agrees_with(&inferred.kind) {
                    inferred.conflict = true;
                    record.secondary.push(inferred);
                }
            }
            records.insert(target.clone(), record);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
