//! Tunable confidences and leveling options.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for relationship derivation and generation leveling.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use kinship::KinshipConfig;
///
/// let config = KinshipConfig::from_json(r#"{ "in_law_confidence": 0.6 }"#).unwrap();
/// assert_eq!(config.in_law_confidence, 0.6);
/// assert_eq!(config.step_confidence, 0.8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinshipConfig {
    /// Siblings sharing exactly one recorded parent.
    pub half_sibling_confidence: f64,

    /// Cousins of degree 2 and beyond.
    pub distant_cousin_confidence: f64,

    /// Cap for relations that run through a recorded sibling link.
    pub declared_sibling_confidence: f64,

    /// Step-parents, step-siblings, step-children.
    pub step_confidence: f64,

    /// Generic in-law relations.
    pub in_law_confidence: f64,

    /// Multiplier applied to losing candidates kept as secondary records.
    pub secondary_confidence_factor: f64,

    /// Parentless spouses take their partner's generation level.
    pub align_spouse_generations: bool,

    /// Maximum generations searched up or down when deriving relations.
    /// `None` searches the whole tree.
    pub max_depth: Option<u32>,
}

impl Default for KinshipConfig {
    fn default() -> Self {
        Self {
            half_sibling_confidence: 0.9,
            distant_cousin_confidence: 0.85,
            declared_sibling_confidence: 0.9,
            step_confidence: 0.8,
            in_law_confidence: 0.7,
            secondary_confidence_factor: 0.5,
            align_spouse_generations: false,
            max_depth: None,
        }
    }
}

impl KinshipConfig {
    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let confidences = [
            ("half_sibling_confidence", self.half_sibling_confidence),
            ("distant_cousin_confidence", self.distant_cousin_confidence),
            ("declared_sibling_confidence", self.declared_sibling_confidence),
            ("step_confidence", self.step_confidence),
            ("in_law_confidence", self.in_law_confidence),
            ("secondary_confidence_factor", self.secondary_confidence_factor),
        ];
        for (name, value) in confidences {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if self.max_depth == Some(0) {
            return Err(Error::Config("max_depth must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether a distance lies inside the configured search depth.
    pub(crate) fn within_depth(&self, distance: u32) -> bool {
        self.max_depth.is_none_or(|max| distance <= max)
    }
}
