//! Relation edges between people.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Gender, PersonId, RelationshipKind};

/// Opaque edge identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Manually asserted relationship labels.
///
/// Every variant reads as "`from` is the `<kind>` of `to`". Gendered forms
/// are chosen at label time, so aunt and uncle share one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendedKind {
    #[serde(alias = "aunt", alias = "uncle")]
    AuntUncle,
    #[serde(alias = "niece", alias = "nephew")]
    NieceNephew,
    Cousin,
    Sibling,
    Grandparent,
    Grandchild,
    StepParent,
    StepChild,
    StepSibling,
    Guardian,
    Ward,
    Godparent,
    Godchild,
    FosterParent,
    FosterChild,
    Partner,
}

impl ExtendedKind {
    /// The label the other endpoint carries.
    pub fn inverse(self) -> Self {
        match self {
            Self::AuntUncle => Self::NieceNephew,
            Self::NieceNephew => Self::AuntUncle,
            Self::Grandparent => Self::Grandchild,
            Self::Grandchild => Self::Grandparent,
            Self::StepParent => Self::StepChild,
            Self::StepChild => Self::StepParent,
            Self::Guardian => Self::Ward,
            Self::Ward => Self::Guardian,
            Self::Godparent => Self::Godchild,
            Self::Godchild => Self::Godparent,
            Self::FosterParent => Self::FosterChild,
            Self::FosterChild => Self::FosterParent,
            Self::Cousin | Self::Sibling | Self::StepSibling | Self::Partner => self,
        }
    }

    /// Whether the graph structure can confirm or contradict this label.
    ///
    /// Guardianship, godparenthood, fostering and partnership are social
    /// facts layered on top of kinship and never conflict with it.
    pub fn is_structural(self) -> bool {
        !matches!(
            self,
            Self::Guardian
                | Self::Ward
                | Self::Godparent
                | Self::Godchild
                | Self::FosterParent
                | Self::FosterChild
                | Self::Partner
        )
    }

    /// Whether an inferred relationship says the same thing as this label.
    /// An in-law agrees with the label of the kind it is an in-law of, so an
    /// uncle's wife may be recorded as an aunt.
    pub fn agrees_with(self, inferred: &RelationshipKind) -> bool {
        use RelationshipKind as K;
        if let K::InLaw(inner) = inferred {
            return self.agrees_with(inner);
        }
        match self {
            Self::AuntUncle => matches!(inferred, K::AuntUncle { .. }),
            Self::NieceNephew => matches!(inferred, K::NieceNephew { .. }),
            Self::Cousin => matches!(inferred, K::Cousin { .. }),
            Self::Sibling => matches!(inferred, K::Sibling { .. }),
            Self::Grandparent => matches!(inferred, K::Grandparent | K::GreatGrandparent { .. }),
            Self::Grandchild => matches!(inferred, K::Grandchild | K::GreatGrandchild { .. }),
            Self::StepParent => matches!(inferred, K::StepParent),
            Self::StepChild => matches!(inferred, K::StepChild),
            Self::StepSibling => matches!(inferred, K::StepSibling),
            _ => true,
        }
    }

    /// Display noun for a person of the given gender holding this role.
    pub fn label(self, gender: Gender) -> String {
        let pick = |male: &str, female: &str, neutral: &str| -> String {
            match gender {
                Gender::Male => male.to_string(),
                Gender::Female => female.to_string(),
                Gender::Other | Gender::Unknown => neutral.to_string(),
            }
        };
        match self {
            Self::AuntUncle => pick("Uncle", "Aunt", "Aunt/Uncle"),
            Self::NieceNephew => pick("Nephew", "Niece", "Niece/Nephew"),
            Self::Cousin => "Cousin".to_string(),
            Self::Sibling => pick("Brother", "Sister", "Sibling"),
            Self::Grandparent => pick("Grandfather", "Grandmother", "Grandparent"),
            Self::Grandchild => pick("Grandson", "Granddaughter", "Grandchild"),
            Self::StepParent => pick("Stepfather", "Stepmother", "Step-Parent"),
            Self::StepChild => pick("Stepson", "Stepdaughter", "Step-Child"),
            Self::StepSibling => pick("Step-Brother", "Step-Sister", "Step-Sibling"),
            Self::Guardian => "Guardian".to_string(),
            Self::Ward => "Ward".to_string(),
            Self::Godparent => pick("Godfather", "Godmother", "Godparent"),
            Self::Godchild => pick("Godson", "Goddaughter", "Godchild"),
            Self::FosterParent => pick("Foster Father", "Foster Mother", "Foster Parent"),
            Self::FosterChild => pick("Foster Son", "Foster Daughter", "Foster Child"),
            Self::Partner => "Partner".to_string(),
        }
    }
}

impl std::fmt::Display for ExtendedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AuntUncle => "aunt_uncle",
            Self::NieceNephew => "niece_nephew",
            Self::Cousin => "cousin",
            Self::Sibling => "sibling",
            Self::Grandparent => "grandparent",
            Self::Grandchild => "grandchild",
            Self::StepParent => "step_parent",
            Self::StepChild => "step_child",
            Self::StepSibling => "step_sibling",
            Self::Guardian => "guardian",
            Self::Ward => "ward",
            Self::Godparent => "godparent",
            Self::Godchild => "godchild",
            Self::FosterParent => "foster_parent",
            Self::FosterChild => "foster_child",
            Self::Partner => "partner",
        };
        f.write_str(s)
    }
}

/// The type of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeKind {
    /// `from` is a parent of `to`.
    Parent,

    /// Marriage or partnership, undirected. An `end` date marks it as over.
    Spouse {
        #[serde(default)]
        start: Option<NaiveDate>,
        #[serde(default)]
        end: Option<NaiveDate>,
    },

    /// Recorded sibling link, undirected, independent of shared parents.
    Sibling,

    /// Manually asserted label for the ordered pair.
    ExplicitExtended { kind: ExtendedKind },
}

impl EdgeKind {
    pub fn is_parent(&self) -> bool {
        matches!(self, Self::Parent)
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parent => f.write_str("parent"),
            Self::Spouse { .. } => f.write_str("spouse"),
            Self::Sibling => f.write_str("sibling"),
            Self::ExplicitExtended { kind } => write!(f, "explicit:{kind}"),
        }
    }
}

/// An edge between two people.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationEdge {
    pub id: EdgeId,
    pub from: PersonId,
    pub to: PersonId,
    pub kind: EdgeKind,
}

impl RelationEdge {
    pub fn new(
        id: impl Into<EdgeId>,
        from: impl Into<PersonId>,
        to: impl Into<PersonId>,
        kind: EdgeKind,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            kind,
        }
    }

    pub fn parent(id: impl Into<EdgeId>, parent: impl Into<PersonId>, child: impl Into<PersonId>) -> Self {
        Self::new(id, parent, child, EdgeKind::Parent)
    }

    pub fn spouse(id: impl Into<EdgeId>, a: impl Into<PersonId>, b: impl Into<PersonId>) -> Self {
        Self::new(id, a, b, EdgeKind::Spouse { start: None, end: None })
    }

    pub fn sibling(id: impl Into<EdgeId>, a: impl Into<PersonId>, b: impl Into<PersonId>) -> Self {
        Self::new(id, a, b, EdgeKind::Sibling)
    }

    pub fn explicit(
        id: impl Into<EdgeId>,
        from: impl Into<PersonId>,
        to: impl Into<PersonId>,
        kind: ExtendedKind,
    ) -> Self {
        Self::new(id, from, to, EdgeKind::ExplicitExtended { kind })
    }

    /// The other endpoint of the edge, if `id` is one of them.
    pub fn other(&self, id: &PersonId) -> Option<&PersonId> {
        if *id == self.from {
            Some(&self.to)
        } else if *id == self.to {
            Some(&self.from)
        } else {
            None
        }
    }
}
