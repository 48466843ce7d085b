//! Person in the family graph.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque person identifier, unique within one tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PersonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Recorded gender. Drives the choice of gendered nouns only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

/// A person, as owned by the external store.
///
/// The engine treats people as an immutable snapshot and never edits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub birth: Option<NaiveDate>,
    #[serde(default)]
    pub death: Option<NaiveDate>,
    /// Pins the display generation of this person.
    #[serde(default)]
    pub generation_override: Option<i32>,
}

impl Person {
    pub fn new(id: impl Into<PersonId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            gender: None,
            birth: None,
            death: None,
            generation_override: None,
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_birth(mut self, birth: NaiveDate) -> Self {
        self.birth = Some(birth);
        self
    }

    pub fn with_death(mut self, death: NaiveDate) -> Self {
        self.death = Some(death);
        self
    }

    pub fn with_generation(mut self, level: i32) -> Self {
        self.generation_override = Some(level);
        self
    }

    /// Gender with missing values folded into `Unknown`.
    pub fn gender(&self) -> Gender {
        self.gender.unwrap_or_default()
    }
}
