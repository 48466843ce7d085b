//! Display labels for derived relationships.
//!
//! Gendered nouns come from the target's gender; unknown or other gender
//! falls back to the neutral form instead of guessing.

use crate::model::{Gender, Person, RelationshipKind};

/// Full label for `target` as seen from `focal`, with the big/little
/// qualifier on siblings when both birth dates are known.
pub fn describe(kind: &RelationshipKind, target: &Person, focal: &Person) -> String {
    let noun = noun(kind, target.gender());
    match kind {
        RelationshipKind::Sibling { .. } => match (target.birth, focal.birth) {
            (Some(theirs), Some(mine)) if theirs < mine => format!("Big {noun}"),
            (Some(theirs), Some(mine)) if theirs > mine => format!("Little {noun}"),
            _ => noun,
        },
        _ => noun,
    }
}

/// Label without age qualifiers.
pub fn noun(kind: &RelationshipKind, gender: Gender) -> String {
    let pick = |male: &str, female: &str, neutral: &str| -> String {
        match gender {
            Gender::Male => male.to_string(),
            Gender::Female => female.to_string(),
            Gender::Other | Gender::Unknown => neutral.to_string(),
        }
    };

    match kind {
        RelationshipKind::Parent => pick("Father", "Mother", "Parent"),
        RelationshipKind::Child => pick("Son", "Daughter", "Child"),
        RelationshipKind::Grandparent => pick("Grandfather", "Grandmother", "Grandparent"),
        RelationshipKind::Grandchild => pick("Grandson", "Granddaughter", "Grandchild"),
        RelationshipKind::GreatGrandparent { greats } => {
            format!("{greats}x-Great-{}", pick("Grandfather", "Grandmother", "Grandparent"))
        }
        RelationshipKind::GreatGrandchild { greats } => {
            format!("{greats}x-Great-{}", pick("Grandson", "Granddaughter", "Grandchild"))
        }
        RelationshipKind::Sibling { half } => {
            let noun = pick("Brother", "Sister", "Sibling");
            if *half { format!("Half-{noun}") } else { noun }
        }
        RelationshipKind::AuntUncle { greats } => {
            format!("{}{}", greats_prefix(*greats), pick("Uncle", "Aunt", "Aunt/Uncle"))
        }
        RelationshipKind::NieceNephew { greats } => {
            let noun = pick("Nephew", "Niece", "Niece/Nephew");
            match greats {
                0 => noun,
                1 => format!("Grand-{noun}"),
                g => format!("{}Grand-{noun}", greats_prefix(g - 1)),
            }
        }
        RelationshipKind::Cousin { degree, removed } => match removed {
            0 => format!("{} Cousin", ordinal(*degree)),
            r => format!("{} Cousin, {r}x Removed", ordinal(*degree)),
        },
        RelationshipKind::Spouse { former } => {
            let noun = pick("Husband", "Wife", "Spouse");
            if *former { format!("Ex-{noun}") } else { noun }
        }
        RelationshipKind::StepParent => pick("Stepfather", "Stepmother", "Step-Parent"),
        RelationshipKind::StepChild => pick("Stepson", "Stepdaughter", "Step-Child"),
        RelationshipKind::StepSibling => pick("Step-Brother", "Step-Sister", "Step-Sibling"),
        RelationshipKind::InLaw(inner) => format!("{}-in-law", noun(inner, gender)),
        RelationshipKind::Explicit(kind) => kind.label(gender),
    }
}

/// Collateral prefix: "", "Great-", "2x Great-", ...
fn greats_prefix(greats: u32) -> String {
    match greats {
        0 => String::new(),
        1 => "Great-".to_string(),
        n => format!("{n}x Great-"),
    }
}

/// Ordinal word for cousin degrees: First, Second, ... then 11th, 21st.
pub fn ordinal(n: u32) -> String {
    const WORDS: [&str; 10] = [
        "First", "Second", "Third", "Fourth", "Fifth", "Sixth", "Seventh", "Eighth", "Ninth", "Tenth",
    ];
    if (1..=10).contains(&n) {
        return WORDS[(n - 1) as usize].to_string();
    }
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
