//! Response types returned by [`SurvivalService`](crate::service::SurvivalService).

use lifeline_assess::{feedback, risk};
use lifeline_features::{label::Label, observation::Observation};
use lifeline_forest::{forest::ClassProbabilities, params::ForestParams};
use serde::{Deserialize, Serialize};

use crate::{
    RiskLevel,
    snapshot::{ModelError, Snapshot, TrainingStats},
};

/// Name reported for the classifier in [`ModelInfo`].
pub const MODEL_TYPE: &str = "RandomForestClassifier";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetrics {
    /// Field names of the submitted record in submission order, including ignored ones.
    pub provided_fields: Vec<String>,
    pub field_count: usize,
    /// Submitted readings the model was not trained on; they do not affect the prediction.
    pub unknown_fields: Vec<String>,
    /// Sum of the fired risk rule scores.
    pub risk_score: u32,
    pub prediction_probabilities: ClassProbabilities,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub astronaut_status: Label,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub feedback: Vec<String>,
    pub metrics: PredictionMetrics,
}

impl Prediction {
    /// Runs `observation` through `snapshot` and the rule-based assessments.
    ///
    /// `provided_fields` are reported back verbatim; they may include fields that were
    /// excluded from `observation`.
    pub fn evaluate(
        snapshot: &Snapshot,
        provided_fields: Vec<String>,
        observation: &Observation,
    ) -> Result<Self, ModelError> {
        let probabilities = snapshot.probabilities(observation)?;
        let status = probabilities.label();
        let confidence = probabilities.confidence();
        let assessment = risk::assess(observation, status);
        let feedback = feedback::generate(observation, status, confidence);
        let unknown_fields = snapshot
            .unknown_fields(observation)
            .map(str::to_owned)
            .collect();

        Ok(Self {
            astronaut_status: status,
            confidence,
            risk_level: assessment.level,
            feedback,
            metrics: PredictionMetrics {
                field_count: provided_fields.len(),
                provided_fields,
                unknown_fields,
                risk_score: assessment.score,
                prediction_probabilities: probabilities,
            },
        })
    }
}

/// What the service currently knows about its model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelInfo {
    Untrained {
        message: String,
    },
    Trained {
        model_type: String,
        training_stats: TrainingStats,
        feature_names: Vec<String>,
        params: ForestParams,
    },
}

impl ModelInfo {
    #[must_use]
    pub fn untrained() -> Self {
        Self::Untrained {
            message: "no model trained yet".to_owned(),
        }
    }

    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let stats = snapshot.stats();
        Self::Trained {
            model_type: MODEL_TYPE.to_owned(),
            feature_names: stats.feature_names.clone(),
            training_stats: stats.clone(),
            params: *snapshot.forest().params(),
        }
    }

    #[must_use]
    pub fn is_trained(&self) -> bool {
        matches!(self, Self::Trained { .. })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{snapshot::tests::sample_records, training::TrainingSet};

    fn snapshot() -> Snapshot {
        let set = TrainingSet::from_records(&sample_records()).unwrap();
        Snapshot::fit(&set, ForestParams::DEFAULT).unwrap()
    }

    #[test]
    fn test_healthy_reading() {
        let observation = Observation::from_iter([("oxygen_level", 21.0), ("co2_level", 0.35)]);
        let fields = vec!["oxygen_level".to_owned(), "co2_level".to_owned()];
        let prediction = Prediction::evaluate(&snapshot(), fields, &observation).unwrap();

        assert_eq!(prediction.astronaut_status, Label::Alive);
        assert_eq!(prediction.risk_level, RiskLevel::Low);
        assert_eq!(prediction.metrics.field_count, 2);
        assert_eq!(prediction.metrics.risk_score, 0);
        assert!(prediction.metrics.unknown_fields.is_empty());
        assert!(
            (prediction.confidence - prediction.metrics.prediction_probabilities.alive).abs()
                < f64::EPSILON
        );
        assert_eq!(prediction.feedback[0], "✓ Oxygen at 21% - Normal");
        assert!(prediction.feedback.last().unwrap().contains("Overall status"));
    }

    #[test]
    fn test_dead_prediction_is_critical() {
        let observation = Observation::from_iter([("oxygen_level", 14.5), ("co2_level", 2.5)]);
        let prediction = Prediction::evaluate(&snapshot(), Vec::new(), &observation).unwrap();

        assert_eq!(prediction.astronaut_status, Label::Dead);
        assert_eq!(prediction.risk_level, RiskLevel::Critical);
        assert_eq!(prediction.metrics.risk_score, 6);
        assert!(prediction.feedback.last().unwrap().contains("CRITICAL"));
    }

    #[test]
    fn test_serialized_shape() {
        let observation = Observation::from_iter([("oxygen_level", 21.0), ("radio_id", 4.0)]);
        let prediction = Prediction::evaluate(
            &snapshot(),
            vec!["oxygen_level".to_owned(), "radio_id".to_owned()],
            &observation,
        )
        .unwrap();
        let value = serde_json::to_value(&prediction).unwrap();

        assert_eq!(value["astronaut_status"], "alive");
        assert_eq!(value["risk_level"], "LOW");
        assert_eq!(value["metrics"]["field_count"], 2);
        assert_eq!(value["metrics"]["unknown_fields"], json!(["radio_id"]));
        assert!(value["metrics"]["prediction_probabilities"]["dead"].is_number());
    }

    #[test]
    fn test_model_info() {
        let untrained = serde_json::to_value(ModelInfo::untrained()).unwrap();
        assert_eq!(untrained["state"], "untrained");

        let info = ModelInfo::from_snapshot(&snapshot());
        assert!(info.is_trained());
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["state"], "trained");
        assert_eq!(value["model_type"], MODEL_TYPE);
        assert_eq!(value["params"]["tree_count"], 100);
        assert_eq!(value["training_stats"]["samples"], 24);
        assert_eq!(
            value["feature_names"],
            json!(["co2_level", "oxygen_level", "temperature"])
        );
    }
}
