//! Validation of labelled training records.

use lifeline_features::{
    label::{LABEL_FIELD, Label},
    observation::{Observation, SchemaError},
};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ValidationError {
    #[display("training data contains no records")]
    Empty,
    #[display("record {index} has no `status` field")]
    MissingLabel { index: usize },
    #[display("record {index} has a non-string `status` value")]
    NonStringLabel { index: usize },
    #[display(
        "found {count} invalid `status` values (first at record {first_index}: \
         {first_value:?}); must be \"alive\" or \"dead\""
    )]
    InvalidLabels {
        count: usize,
        first_index: usize,
        first_value: String,
    },
    #[display("record {index}: {source}")]
    InvalidFeature { index: usize, source: SchemaError },
}

/// Labelled observations ready to be fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    observations: Vec<Observation>,
    labels: Vec<Label>,
}

impl TrainingSet {
    /// Validates and coerces raw records.
    ///
    /// Labels are checked before any feature is coerced, so a bad label is reported even when
    /// the same record also carries a bad feature.
    ///
    /// A record without a string `status` stops validation at that record with
    /// [`ValidationError::MissingLabel`] or [`ValidationError::NonStringLabel`], even if earlier
    /// records carried unrecognized label values. Only when every record has a string label are
    /// the unrecognized values counted and reported together as
    /// [`ValidationError::InvalidLabels`].
    pub fn from_records(records: &[Map<String, Value>]) -> Result<Self, ValidationError> {
        if records.is_empty() {
            return Err(ValidationError::Empty);
        }

        let mut labels = Vec::with_capacity(records.len());
        let mut invalid: Option<(usize, String)> = None;
        let mut invalid_count = 0;
        for (index, record) in records.iter().enumerate() {
            let value = record
                .get(LABEL_FIELD)
                .ok_or(ValidationError::MissingLabel { index })?;
            let text = value
                .as_str()
                .ok_or(ValidationError::NonStringLabel { index })?;
            match Label::parse(text) {
                Some(label) => labels.push(label),
                None => {
                    invalid_count += 1;
                    invalid.get_or_insert_with(|| (index, text.to_owned()));
                }
            }
        }
        if let Some((first_index, first_value)) = invalid {
            return Err(ValidationError::InvalidLabels {
                count: invalid_count,
                first_index,
                first_value,
            });
        }

        let observations = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                Observation::from_record_excluding(record, &[LABEL_FIELD])
                    .map_err(|source| ValidationError::InvalidFeature { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            observations,
            labels,
        })
    }

    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|l| **l == label).count()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn records(value: Value) -> Vec<Map<String, Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_accepts_valid_records() {
        let set = TrainingSet::from_records(&records(json!([
            {"oxygen_level": 20, "status": "alive"},
            {"oxygen_level": 15, "co2_level": 2.0, "status": "dead"},
            {"temperature": 22, "status": "alive"},
        ])))
        .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.count(Label::Alive), 2);
        assert_eq!(set.count(Label::Dead), 1);
        assert_eq!(set.observations()[1].get("co2_level"), Some(2.0));
        assert_eq!(set.observations()[0].get(LABEL_FIELD), None);
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(
            TrainingSet::from_records(&[]).unwrap_err(),
            ValidationError::Empty
        );
    }

    #[test]
    fn test_rejects_missing_label() {
        let err = TrainingSet::from_records(&records(json!([
            {"oxygen_level": 20, "status": "alive"},
            {"oxygen_level": 15},
        ])))
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingLabel { index: 1 });
    }

    #[test]
    fn test_rejects_non_string_label() {
        let err = TrainingSet::from_records(&records(json!([{"status": 1}]))).unwrap_err();
        assert_eq!(err, ValidationError::NonStringLabel { index: 0 });
    }

    #[test]
    fn test_counts_invalid_labels() {
        let err = TrainingSet::from_records(&records(json!([
            {"oxygen_level": 20, "status": "alive"},
            {"oxygen_level": 15, "status": "unknown"},
            {"oxygen_level": 16, "status": "Dead"},
        ])))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidLabels {
                count: 2,
                first_index: 1,
                first_value: "unknown".to_owned(),
            }
        );
        assert!(err.to_string().contains("2 invalid"));
    }

    #[test]
    fn test_structural_label_problem_takes_precedence() {
        let err = TrainingSet::from_records(&records(json!([
            {"oxygen_level": 20, "status": "ALIVE"},
            {"oxygen_level": 15, "status": "unknown"},
            {"oxygen_level": 16},
        ])))
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingLabel { index: 2 });
    }

    #[test]
    fn test_rejects_non_numeric_feature() {
        let err = TrainingSet::from_records(&records(json!([
            {"oxygen_level": 20, "status": "alive"},
            {"oxygen_level": "low", "status": "dead"},
        ])))
        .unwrap_err();
        match err {
            ValidationError::InvalidFeature { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(source.field, "oxygen_level");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
