//! Heuristic risk tiering from raw readings.
//!
//! Every row of [`RISK_RULES`] whose field is present and whose condition matches adds its
//! score. The total maps to a tier:
//!
//! | Score   | Tier       |
//! |---------|------------|
//! | `>= 5`  | `HIGH`     |
//! | `2..5`  | `MEDIUM`   |
//! | `< 2`   | `LOW`      |
//!
//! A `dead` prediction overrides the score and always yields `CRITICAL`. The classifier's
//! confidence is deliberately not an input.

use lifeline_features::{label::Label, observation::Observation};
use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// Minimum score for [`RiskLevel::High`].
pub const HIGH_RISK_SCORE: u32 = 5;
/// Minimum score for [`RiskLevel::Medium`].
pub const MEDIUM_RISK_SCORE: u32 = 2;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[display("LOW")]
    Low,
    #[display("MEDIUM")]
    Medium,
    #[display("HIGH")]
    High,
    #[display("CRITICAL")]
    Critical,
}

impl RiskLevel {
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_RISK_SCORE {
            Self::High
        } else if score >= MEDIUM_RISK_SCORE {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One row of the risk table.
#[derive(Debug, Clone, Copy)]
pub struct RiskRule {
    pub field: &'static str,
    pub condition: Condition,
    pub score: u32,
}

pub static RISK_RULES: [RiskRule; 6] = [
    RiskRule {
        field: "oxygen_level",
        condition: Condition::Any(&[Condition::Below(18.0), Condition::Above(25.0)]),
        score: 3,
    },
    RiskRule {
        field: "oxygen_level",
        condition: Condition::Any(&[
            Condition::All(&[Condition::AtLeast(18.0), Condition::Below(19.5)]),
            Condition::All(&[Condition::Above(23.5), Condition::AtMost(25.0)]),
        ]),
        score: 1,
    },
    RiskRule {
        field: "co2_level",
        condition: Condition::Above(1.0),
        score: 3,
    },
    RiskRule {
        field: "radiation",
        condition: Condition::Above(0.5),
        score: 3,
    },
    RiskRule {
        field: "food_supply_days",
        condition: Condition::Below(7.0),
        score: 2,
    },
    RiskRule {
        field: "water_supply_days",
        condition: Condition::Below(3.0),
        score: 2,
    },
];

/// A rule that fired for an observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub field: String,
    pub condition: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// Sum of the fired rule scores, even when the level is overridden.
    pub score: u32,
    pub factors: Vec<RiskFactor>,
}

/// Scores `observation` against [`RISK_RULES`].
#[must_use]
pub fn assess(observation: &Observation, predicted: Label) -> RiskAssessment {
    let factors = RISK_RULES
        .iter()
        .filter(|rule| {
            observation
                .get(rule.field)
                .is_some_and(|value| rule.condition.matches(value))
        })
        .map(|rule| RiskFactor {
            field: rule.field.to_owned(),
            condition: rule.condition.to_string(),
            score: rule.score,
        })
        .collect::<Vec<_>>();
    let score = factors.iter().map(|f| f.score).sum();
    let level = match predicted {
        Label::Dead => RiskLevel::Critical,
        Label::Alive => RiskLevel::from_score(score),
    };
    RiskAssessment {
        level,
        score,
        factors,
    }
}

/// Shorthand for `assess(..).level`.
#[must_use]
pub fn risk_level(observation: &Observation, predicted: Label) -> RiskLevel {
    assess(observation, predicted).level
}
