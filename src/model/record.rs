//! Derived relationship records, the engine's output DTOs.

use serde::{Deserialize, Serialize};

use super::{EdgeId, ExtendedKind, PersonId};

/// What a target person is to the focal person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RelationshipKind {
    Parent,
    Child,
    Grandparent,
    Grandchild,
    /// `greats` = 1 is a great-grandparent.
    GreatGrandparent { greats: u32 },
    GreatGrandchild { greats: u32 },
    Sibling { half: bool },
    /// `greats` = 0 is an aunt/uncle, 1 a great-aunt/uncle.
    AuntUncle { greats: u32 },
    /// `greats` = 0 is a niece/nephew, 1 a grand-niece/nephew.
    NieceNephew { greats: u32 },
    /// `degree` = 1 is a first cousin.
    Cousin { degree: u32, removed: u32 },
    Spouse { former: bool },
    StepParent,
    StepChild,
    StepSibling,
    InLaw(Box<RelationshipKind>),
    Explicit(ExtendedKind),
}

impl RelationshipKind {
    /// Lineal kind for an ancestor `generations` steps up.
    pub fn ancestor(generations: u32) -> Self {
        match generations {
            0 | 1 => Self::Parent,
            2 => Self::Grandparent,
            g => Self::GreatGrandparent { greats: g - 2 },
        }
    }

    /// Lineal kind for a descendant `generations` steps down.
    pub fn descendant(generations: u32) -> Self {
        match generations {
            0 | 1 => Self::Child,
            2 => Self::Grandchild,
            g => Self::GreatGrandchild { greats: g - 2 },
        }
    }

    /// The kind the focal person holds from the target's point of view.
    pub fn inverse(&self) -> Self {
        match self {
            Self::Parent => Self::Child,
            Self::Child => Self::Parent,
            Self::Grandparent => Self::Grandchild,
            Self::Grandchild => Self::Grandparent,
            Self::GreatGrandparent { greats } => Self::GreatGrandchild { greats: *greats },
            Self::GreatGrandchild { greats } => Self::GreatGrandparent { greats: *greats },
            Self::AuntUncle { greats } => Self::NieceNephew { greats: *greats },
            Self::NieceNephew { greats } => Self::AuntUncle { greats: *greats },
            Self::StepParent => Self::StepChild,
            Self::StepChild => Self::StepParent,
            Self::InLaw(inner) => Self::InLaw(Box::new(inner.inverse())),
            Self::Explicit(kind) => Self::Explicit(kind.inverse()),
            Self::Sibling { .. } | Self::Cousin { .. } | Self::Spouse { .. } | Self::StepSibling => {
                self.clone()
            }
        }
    }

    pub fn is_lineal(&self) -> bool {
        matches!(
            self,
            Self::Parent
                | Self::Child
                | Self::Grandparent
                | Self::Grandchild
                | Self::GreatGrandparent { .. }
                | Self::GreatGrandchild { .. }
        )
    }
}

/// How a record was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Parent edges only.
    Blood,
    /// Parent edges plus at least one recorded sibling link.
    Declared,
    /// A direct spouse edge.
    Marriage,
    /// A parent's spouse, or a spouse's child.
    Step,
    /// A blood relative's spouse, or a spouse's blood relative.
    InLaw,
    /// A manually asserted edge.
    Explicit,
}

impl PathKind {
    pub fn is_blood(self) -> bool {
        matches!(self, Self::Blood | Self::Declared)
    }
}

/// One relationship between the focal person and a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub target_id: PersonId,
    pub kind: RelationshipKind,
    pub label: String,
    pub confidence: f64,
    pub path_kind: PathKind,
    /// Nearest common ancestor for collateral records, the relative holding
    /// the recorded sibling link for declared ones, the connecting relative
    /// for step and in-law records.
    pub via: Option<PersonId>,
    /// Alternatives that lost to this record, at reduced confidence.
    #[serde(default)]
    pub secondary: Vec<RelationshipRecord>,
    /// Set on a secondary record that an explicit edge contradicts.
    #[serde(default)]
    pub conflict: bool,
}

/// Explicit edge that disagrees with the structure of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub edge_id: EdgeId,
    /// `(from, to)` of the explicit edge.
    pub pair: (PersonId, PersonId),
    pub inferred: RelationshipKind,
    pub inferred_label: String,
    pub explicit: ExtendedKind,
    pub explicit_label: String,
}

impl ConflictRecord {
    /// Human-readable warning for surfacing next to the edge.
    pub fn message(&self) -> String {
        format!(
            "Potential conflict: {} and {} are recorded as {} but the tree implies {}",
            self.pair.0, self.pair.1, self.explicit, self.inferred_label
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lineal_constructors() {
        assert_eq!(RelationshipKind::ancestor(1), RelationshipKind::Parent);
        assert_eq!(RelationshipKind::ancestor(2), RelationshipKind::Grandparent);
        assert_eq!(
            RelationshipKind::ancestor(5),
            RelationshipKind::GreatGrandparent { greats: 3 }
        );
        assert_eq!(RelationshipKind::descendant(3), RelationshipKind::GreatGrandchild { greats: 1 });
    }

    #[test]
    fn test_inverse_round_trips() {
        let kinds = [
            RelationshipKind::Grandparent,
            RelationshipKind::AuntUncle { greats: 2 },
            RelationshipKind::Cousin { degree: 2, removed: 1 },
            RelationshipKind::InLaw(Box::new(RelationshipKind::Parent)),
            RelationshipKind::Explicit(ExtendedKind::Guardian),
            RelationshipKind::StepChild,
        ];
        for kind in kinds {
            assert_eq!(kind.inverse().inverse(), kind);
        }
        assert_eq!(
            RelationshipKind::InLaw(Box::new(RelationshipKind::Parent)).inverse(),
            RelationshipKind::InLaw(Box::new(RelationshipKind::Child))
        );
    }

    #[test]
    fn test_kind_serializes_adjacently_tagged() {
        let json = serde_json::to_value(RelationshipKind::Cousin { degree: 1, removed: 0 }).unwrap();
        assert_eq!(json["type"], "cousin");
        assert_eq!(json["value"]["degree"], 1);

        let json = serde_json::to_value(RelationshipKind::Explicit(ExtendedKind::Godparent)).unwrap();
        assert_eq!(json["value"], "godparent");
    }
}
