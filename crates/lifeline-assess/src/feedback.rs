//! Human-readable advisories.
//!
//! [`FIELD_CHECKS`] lists the recognized readings in the order their advisories appear. Each
//! check looks its value up under one or more field names (the first present one wins) and
//! walks its tiers top to bottom; the first matching tier decides the severity and note, and a
//! value matching no tier is reported as normal. A message reads:
//!
//! ```text
//! ⚠️ CRITICAL: Oxygen at 17% - Immediate action required!
//! ✓ Temperature 22°C - Comfortable
//! ```
//!
//! The list always ends with an overall status line derived from the prediction (see
//! [`OverallStatus`]). If no recognized reading is present, [`NO_FEEDBACK_MESSAGE`] stands in
//! for the per-field lines, so the list is never empty.

use lifeline_features::{label::Label, observation::Observation};
use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// Confidence above which a surviving prediction is considered stable.
pub const STABLE_CONFIDENCE: f64 = 0.8;

/// Placeholder emitted when no recognized reading is present.
pub const NO_FEEDBACK_MESSAGE: &str = "No specific sensor feedback available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Normal => "✓ ",
            Self::Warning => "⚠️ WARNING: ",
            Self::Critical => "⚠️ CRITICAL: ",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Tier {
    pub when: Condition,
    pub severity: Severity,
    pub note: &'static str,
}

/// Advisory rules for one kind of reading.
#[derive(Debug, Clone, Copy)]
pub struct FieldCheck {
    /// Field names to look up, in order of preference.
    pub fields: &'static [&'static str],
    pub subject: &'static str,
    /// Appended directly after the value, so it carries its own leading space if any.
    pub unit: &'static str,
    pub tiers: &'static [Tier],
    pub normal_note: &'static str,
}

const fn critical(when: Condition, note: &'static str) -> Tier {
    Tier {
        when,
        severity: Severity::Critical,
        note,
    }
}

const fn warning(when: Condition, note: &'static str) -> Tier {
    Tier {
        when,
        severity: Severity::Warning,
        note,
    }
}

pub static FIELD_CHECKS: [FieldCheck; 7] = [
    FieldCheck {
        fields: &["oxygen_level"],
        subject: "Oxygen at",
        unit: "%",
        tiers: &[
            critical(Condition::Below(18.0), "Immediate action required!"),
            warning(Condition::Below(19.5), "Below safe minimum"),
            warning(Condition::Above(23.5), "Above safe maximum"),
        ],
        normal_note: "Normal",
    },
    FieldCheck {
        fields: &["co2_level"],
        subject: "CO2 at",
        unit: "%",
        tiers: &[
            critical(Condition::Above(1.0), "Scrubbers failing!"),
            warning(Condition::Above(0.5), "Monitor closely"),
        ],
        normal_note: "Normal",
    },
    FieldCheck {
        fields: &["temperature", "heat"],
        subject: "Temperature",
        unit: "°C",
        tiers: &[
            warning(Condition::Below(15.0), "Too cold"),
            warning(Condition::Above(30.0), "Too hot"),
        ],
        normal_note: "Comfortable",
    },
    FieldCheck {
        fields: &["humidity"],
        subject: "Humidity",
        unit: "%",
        tiers: &[
            warning(Condition::Below(30.0), "Too dry"),
            warning(Condition::Above(70.0), "Too humid"),
        ],
        normal_note: "Normal",
    },
    FieldCheck {
        fields: &["radiation"],
        subject: "Radiation",
        unit: " mSv",
        tiers: &[
            critical(Condition::Above(0.5), "Seek shelter!"),
            warning(Condition::Above(0.1), "Elevated levels"),
        ],
        normal_note: "Safe",
    },
    FieldCheck {
        fields: &["food_supply_days"],
        subject: "Food supply",
        unit: " days",
        tiers: &[
            critical(Condition::Below(7.0), "Emergency!"),
            warning(Condition::Below(30.0), "Ration required"),
        ],
        normal_note: "Adequate",
    },
    FieldCheck {
        fields: &["water_supply_days"],
        subject: "Water supply",
        unit: " days",
        tiers: &[
            critical(Condition::Below(3.0), "Emergency!"),
            warning(Condition::Below(14.0), "Ration required"),
        ],
        normal_note: "Adequate",
    },
];

impl FieldCheck {
    /// Evaluates the check, or returns `None` when none of its fields is present.
    #[must_use]
    pub fn evaluate(&self, observation: &Observation) -> Option<Advisory> {
        let value = observation.get_first(self.fields)?;
        let (severity, note) = self
            .tiers
            .iter()
            .find(|tier| tier.when.matches(value))
            .map_or((Severity::Normal, self.normal_note), |tier| {
                (tier.severity, tier.note)
            });
        Some(Advisory {
            severity,
            message: format!(
                "{}{} {value}{} - {note}",
                severity.marker(),
                self.subject,
                self.unit
            ),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    #[display("STABLE")]
    Stable,
    #[display("MARGINAL")]
    Marginal,
    #[display("CRITICAL")]
    Critical,
}

impl OverallStatus {
    /// `dead` is always critical, whatever the confidence.
    #[must_use]
    pub fn from_prediction(predicted: Label, confidence: f64) -> Self {
        match predicted {
            Label::Dead => Self::Critical,
            Label::Alive if confidence > STABLE_CONFIDENCE => Self::Stable,
            Label::Alive => Self::Marginal,
        }
    }

    fn severity(self) -> Severity {
        match self {
            Self::Stable => Severity::Normal,
            Self::Marginal | Self::Critical => Severity::Warning,
        }
    }
}

/// A single advisory line with its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub severity: Severity,
    pub message: String,
}

/// Builds every advisory for an observation and its prediction.
#[must_use]
pub fn advise(observation: &Observation, predicted: Label, confidence: f64) -> Vec<Advisory> {
    let mut advisories = FIELD_CHECKS
        .iter()
        .filter_map(|check| check.evaluate(observation))
        .collect::<Vec<_>>();
    if advisories.is_empty() {
        advisories.push(Advisory {
            severity: Severity::Normal,
            message: NO_FEEDBACK_MESSAGE.to_owned(),
        });
    }

    let status = OverallStatus::from_prediction(predicted, confidence);
    let severity = status.severity();
    advisories.push(Advisory {
        severity,
        message: format!(
            "{}Overall status: {status} (confidence: {:.1}%)",
            severity.marker(),
            confidence * 100.0
        ),
    });
    advisories
}

/// Like [`advise`], keeping only the messages.
#[must_use]
pub fn generate(observation: &Observation, predicted: Label, confidence: f64) -> Vec<String> {
    advise(observation, predicted, confidence)
        .into_iter()
        .map(|advisory| advisory.message)
        .collect()
}
