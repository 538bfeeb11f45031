//! The fitted pipeline as one immutable value.

use chrono::{DateTime, Utc};
use lifeline_features::{
    encoder::FeatureEncoder,
    label::Label,
    normalizer::{FeatureNormalizer, NormalizeError},
    observation::Observation,
};
use lifeline_forest::{
    ForestError,
    forest::{ClassProbabilities, RandomForest},
    params::ForestParams,
};
use serde::{Deserialize, Serialize};

use crate::training::TrainingSet;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ModelError {
    #[display("normalization failed: {_0}")]
    Normalize(NormalizeError),
    #[display("classifier failed: {_0}")]
    Forest(ForestError),
    #[display("{component} expects {actual} features but the vocabulary has {expected}")]
    Inconsistent {
        component: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Summary of the training run that produced a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub samples: usize,
    pub features: usize,
    pub feature_names: Vec<String>,
    pub alive_count: usize,
    pub dead_count: usize,
    /// Share of training records the fitted forest classifies correctly.
    pub training_accuracy: f64,
    pub trained_at: DateTime<Utc>,
}

/// Encoder vocabulary, normalization statistics, classifier and training statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    encoder: FeatureEncoder,
    normalizer: FeatureNormalizer,
    forest: RandomForest,
    stats: TrainingStats,
}

impl Snapshot {
    /// Fits every pipeline stage on `set`.
    pub fn fit(set: &TrainingSet, params: ForestParams) -> Result<Self, ModelError> {
        let encoder = FeatureEncoder::fit(set.observations());
        let rows = encoder.transform_all(set.observations());
        let normalizer = FeatureNormalizer::fit(&rows).map_err(ModelError::Normalize)?;
        let rows = normalizer
            .transform_all(&rows)
            .map_err(ModelError::Normalize)?;
        let forest = RandomForest::fit(params, &rows, set.labels()).map_err(ModelError::Forest)?;
        let training_accuracy = forest
            .accuracy(&rows, set.labels())
            .map_err(ModelError::Forest)?;

        let stats = TrainingStats {
            samples: set.len(),
            features: encoder.dimension(),
            feature_names: encoder.vocabulary().names().to_vec(),
            alive_count: set.count(Label::Alive),
            dead_count: set.count(Label::Dead),
            training_accuracy,
            trained_at: Utc::now(),
        };
        tracing::info!(
            samples = stats.samples,
            features = stats.features,
            alive = stats.alive_count,
            dead = stats.dead_count,
            accuracy = stats.training_accuracy,
            "model trained"
        );

        Ok(Self {
            encoder,
            normalizer,
            forest,
            stats,
        })
    }

    /// Reassembles a snapshot from its parts, checking that they agree on dimensionality.
    pub fn from_parts(
        encoder: FeatureEncoder,
        normalizer: FeatureNormalizer,
        forest: RandomForest,
        stats: TrainingStats,
    ) -> Result<Self, ModelError> {
        let snapshot = Self {
            encoder,
            normalizer,
            forest,
            stats,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let expected = self.encoder.dimension();
        let components = [
            ("normalizer", self.normalizer.dimension()),
            ("classifier", self.forest.feature_count()),
            ("training statistics", self.stats.features),
        ];
        for (component, actual) in components {
            if actual != expected {
                return Err(ModelError::Inconsistent {
                    component,
                    expected,
                    actual,
                });
            }
        }
        self.normalizer.validate().map_err(ModelError::Normalize)?;
        self.forest.validate().map_err(ModelError::Forest)
    }

    /// Vote shares for a single observation. Unknown fields are dropped by the encoder.
    pub fn probabilities(
        &self,
        observation: &Observation,
    ) -> Result<ClassProbabilities, ModelError> {
        let encoded = self.encoder.transform(observation);
        let normalized = self
            .normalizer
            .transform(&encoded)
            .map_err(ModelError::Normalize)?;
        self.forest
            .predict_probability(&normalized)
            .map_err(ModelError::Forest)
    }

    pub fn predict(&self, observation: &Observation) -> Result<Label, ModelError> {
        Ok(self.probabilities(observation)?.label())
    }

    /// Names of the readings in `observation` that the encoder does not know.
    pub fn unknown_fields<'a>(
        &'a self,
        observation: &'a Observation,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let vocabulary = self.encoder.vocabulary();
        observation
            .field_names()
            .filter(move |name| vocabulary.slot(name).is_none())
    }

    #[must_use]
    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    #[must_use]
    pub fn normalizer(&self) -> &FeatureNormalizer {
        &self.normalizer
    }

    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    #[must_use]
    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }
}
