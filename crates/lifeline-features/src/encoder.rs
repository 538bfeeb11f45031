//! Sparse-to-dense feature encoding.
//!
//! [`FeatureEncoder::fit`] commits a [`FeatureVocabulary`]: the sorted union of every field
//! name seen across the training observations. From then on every observation is encoded into
//! a vector with exactly one slot per vocabulary entry:
//!
//! - fields in the vocabulary fill their slot with the reading
//! - vocabulary fields missing from the observation encode as `0.0`
//! - fields outside the vocabulary are dropped, so inference never widens the vector
//!
//! Batch and single-record encoding share [`FeatureEncoder::transform`], so training rows and
//! inference rows cannot drift apart.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::observation::Observation;

/// Value used for vocabulary fields absent from an observation.
pub const MISSING_VALUE: f64 = 0.0;

/// Ordered set of feature names fixed at training time.
///
/// Slot `i` of an encoded vector holds the reading for `names()[i]`. Serializes as the plain
/// list of names; deserialization rejects lists that are not strictly sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureVocabulary {
    names: Vec<String>,
    slots: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("vocabulary names must be unique and sorted, `{previous}` precedes `{name}`")]
pub struct UnsortedVocabularyError {
    pub previous: String,
    pub name: String,
}

impl FeatureVocabulary {
    fn from_sorted_set(names: BTreeSet<String>) -> Self {
        let names = names.into_iter().collect::<Vec<_>>();
        let slots = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, slots }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the vector slot of `name`, if it is part of the vocabulary.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }
}

impl TryFrom<Vec<String>> for FeatureVocabulary {
    type Error = UnsortedVocabularyError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        if let Some(pair) = names.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(UnsortedVocabularyError {
                previous: pair[0].clone(),
                name: pair[1].clone(),
            });
        }
        Ok(Self::from_sorted_set(names.into_iter().collect()))
    }
}

impl From<FeatureVocabulary> for Vec<String> {
    fn from(vocabulary: FeatureVocabulary) -> Self {
        vocabulary.names
    }
}

/// Encodes observations against a committed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    vocabulary: FeatureVocabulary,
}

impl FeatureEncoder {
    /// Learns the vocabulary from the union of field names of all observations.
    #[must_use]
    pub fn fit(observations: &[Observation]) -> Self {
        let names = observations
            .iter()
            .flat_map(Observation::field_names)
            .map(str::to_owned)
            .collect::<BTreeSet<_>>();
        let vocabulary = FeatureVocabulary::from_sorted_set(names);
        tracing::debug!(features = vocabulary.len(), "feature vocabulary fitted");
        Self { vocabulary }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &FeatureVocabulary {
        &self.vocabulary
    }

    /// Length of every encoded vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// Encodes a single observation.
    #[must_use]
    pub fn transform(&self, observation: &Observation) -> Vec<f64> {
        let mut vector = vec![MISSING_VALUE; self.dimension()];
        for (field, value) in observation {
            if let Some(slot) = self.vocabulary.slot(field) {
                vector[slot] = *value;
            }
        }
        vector
    }

    /// Encodes many observations, one row each.
    #[must_use]
    pub fn transform_all(&self, observations: &[Observation]) -> Vec<Vec<f64>> {
        observations.iter().map(|o| self.transform(o)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_set() -> Vec<Observation> {
        vec![
            Observation::from_iter([("oxygen_level", 21.0), ("temperature", 22.0)]),
            Observation::from_iter([("co2_level", 1.5), ("oxygen_level", 16.0)]),
        ]
    }

    #[test]
    fn test_vocabulary_is_sorted_union() {
        let encoder = FeatureEncoder::fit(&training_set());
        assert_eq!(
            encoder.vocabulary().names(),
            ["co2_level", "oxygen_level", "temperature"]
        );
        assert_eq!(encoder.vocabulary().slot("oxygen_level"), Some(1));
        assert_eq!(encoder.vocabulary().slot("humidity"), None);
    }

    #[test]
    fn test_missing_fields_encode_as_zero() {
        let encoder = FeatureEncoder::fit(&training_set());
        let vector = encoder.transform(&Observation::from_iter([("temperature", 30.0)]));
        assert_eq!(vector, [0.0, 0.0, 30.0]);
    }

    #[test]
    fn test_unseen_fields_are_dropped() {
        let encoder = FeatureEncoder::fit(&training_set());
        let vector = encoder.transform(&Observation::from_iter([
            ("oxygen_level", 19.0),
            ("humidity", 55.0),
            ("heart_rate", 80.0),
        ]));
        assert_eq!(vector.len(), encoder.dimension());
        assert_eq!(vector, [0.0, 19.0, 0.0]);
    }

    #[test]
    fn test_batch_matches_single_transform() {
        let observations = training_set();
        let encoder = FeatureEncoder::fit(&observations);
        let batch = encoder.transform_all(&observations);
        for (row, observation) in batch.iter().zip(&observations) {
            assert_eq!(row, &encoder.transform(observation));
        }
    }

    #[test]
    fn test_encoding_is_stable_across_calls() {
        let encoder = FeatureEncoder::fit(&training_set());
        let query = Observation::from_iter([("co2_level", 0.4), ("oxygen_level", 20.0)]);
        let first = encoder.transform(&query);
        let _unrelated = encoder.transform(&Observation::from_iter([("radiation", 2.0)]));
        assert_eq!(first, encoder.transform(&query));
    }

    #[test]
    fn test_vocabulary_serde_round_trip_and_validation() {
        let encoder = FeatureEncoder::fit(&training_set());
        let json = serde_json::to_string(&encoder).unwrap();
        assert_eq!(
            json,
            r#"{"vocabulary":["co2_level","oxygen_level","temperature"]}"#
        );
        let restored: FeatureEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, encoder);

        let unsorted = serde_json::from_str::<FeatureVocabulary>(r#"["b","a"]"#);
        assert!(unsorted.is_err());
        let duplicated = serde_json::from_str::<FeatureVocabulary>(r#"["a","a"]"#);
        assert!(duplicated.is_err());
    }
}
