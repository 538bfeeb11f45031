//! Rule-based assessments that complement the classifier.
//!
//! The random forest answers "alive or dead?" but cannot say why. This crate derives two
//! explainable outputs straight from the raw readings:
//!
//! 1. **Risk Scoring** ([`risk`]) - Sums per-field rule scores into a coarse
//!    [`risk::RiskLevel`]; a `dead` prediction always yields `CRITICAL`
//! 2. **Feedback** ([`feedback`]) - One advisory line per recognized reading plus an overall
//!    status line driven by the prediction and its confidence
//!
//! Both are pure functions of an [`Observation`](lifeline_features::observation::Observation)
//! and the prediction, and both are driven by static rule tables built from
//! [`condition::Condition`]s. Supporting a new reading means appending a table row.
//!
//! # Example
//!
//! ```
//! use lifeline_assess::{feedback, risk::{self, RiskLevel}};
//! use lifeline_features::{label::Label, observation::Observation};
//!
//! let observation = Observation::from_iter([("oxygen_level", 15.0), ("co2_level", 2.0)]);
//!
//! let assessment = risk::assess(&observation, Label::Alive);
//! assert_eq!(assessment.score, 6);
//! assert_eq!(assessment.level, RiskLevel::High);
//!
//! let lines = feedback::generate(&observation, Label::Alive, 0.62);
//! assert_eq!(lines.len(), 3);
//! assert!(lines[2].contains("MARGINAL"));
//! ```

pub mod condition;
pub mod feedback;
pub mod risk;
