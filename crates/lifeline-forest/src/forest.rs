use std::{panic, thread};

use lifeline_features::label::Label;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{ForestError, params::ForestParams, tree::DecisionTree};

/// Share of ensemble votes per class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub alive: f64,
    pub dead: f64,
}

impl ClassProbabilities {
    #[must_use]
    pub fn get(&self, label: Label) -> f64 {
        match label {
            Label::Alive => self.alive,
            Label::Dead => self.dead,
        }
    }

    /// Larger of the two class shares.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.alive.max(self.dead)
    }

    /// Majority class; an even split resolves to [`Label::Dead`].
    #[must_use]
    pub fn label(&self) -> Label {
        Label::from_alive_share(self.alive)
    }
}

/// Bagged ensemble of [`DecisionTree`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    feature_count: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fits a brand-new forest on `rows` and their `labels`.
    ///
    /// # Arguments
    ///
    /// * `params` - Forest hyperparameters
    /// * `rows` - Normalized training matrix; all rows must share one length
    /// * `labels` - One label per row
    pub fn fit(
        params: ForestParams,
        rows: &[Vec<f64>],
        labels: &[Label],
    ) -> Result<Self, ForestError> {
        let first = rows.first().ok_or(ForestError::EmptyTrainingSet)?;
        if rows.len() != labels.len() {
            return Err(ForestError::LengthMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        if params.tree_count == 0 {
            return Err(ForestError::NoTrees);
        }
        let feature_count = first.len();
        if let Some(row) = rows.iter().find(|row| row.len() != feature_count) {
            return Err(ForestError::DimensionMismatch {
                expected: feature_count,
                actual: row.len(),
            });
        }

        let mut master = Pcg32::seed_from_u64(params.seed);
        let seeds = (0..params.tree_count)
            .map(|_| master.random::<u64>())
            .collect::<Vec<_>>();

        let sample_count = rows.len();
        let trees = thread::scope(|s| {
            let handles = seeds
                .iter()
                .map(|&seed| {
                    s.spawn(move || {
                        let mut rng = Pcg32::seed_from_u64(seed);
                        let samples = (0..sample_count)
                            .map(|_| rng.random_range(0..sample_count))
                            .collect();
                        DecisionTree::fit(rows, labels, samples, feature_count, &params, &mut rng)
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                .collect::<Vec<_>>()
        });

        tracing::debug!(
            trees = trees.len(),
            features = feature_count,
            samples = sample_count,
            max_depth = trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
            "random forest fitted"
        );

        Ok(Self {
            params,
            feature_count,
            trees,
        })
    }

    #[must_use]
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Number of features every input vector must have.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Returns the share of trees voting for each class.
    #[expect(clippy::cast_precision_loss)]
    pub fn predict_probability(&self, x: &[f64]) -> Result<ClassProbabilities, ForestError> {
        self.check_dimension(x)?;
        let alive_votes = self
            .trees
            .iter()
            .filter(|tree| tree.predict(x) == Label::Alive)
            .count();
        let total = self.trees.len();
        Ok(ClassProbabilities {
            alive: alive_votes as f64 / total as f64,
            dead: (total - alive_votes) as f64 / total as f64,
        })
    }

    /// Returns the majority-vote class.
    pub fn predict(&self, x: &[f64]) -> Result<Label, ForestError> {
        Ok(self.predict_probability(x)?.label())
    }

    /// Fraction of `rows` whose prediction matches `labels`.
    #[expect(clippy::cast_precision_loss)]
    pub fn accuracy(&self, rows: &[Vec<f64>], labels: &[Label]) -> Result<f64, ForestError> {
        if rows.len() != labels.len() {
            return Err(ForestError::LengthMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        if rows.is_empty() {
            return Err(ForestError::EmptyTrainingSet);
        }
        let mut correct = 0_usize;
        for (row, label) in rows.iter().zip(labels) {
            if self.predict(row)? == *label {
                correct += 1;
            }
        }
        Ok(correct as f64 / rows.len() as f64)
    }

    /// Checks the invariants a deserialized forest must uphold before it is used.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.trees.is_empty() {
            return Err(ForestError::NoTrees);
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.feature_count)?;
        }
        Ok(())
    }

    fn check_dimension(&self, x: &[f64]) -> Result<(), ForestError> {
        if x.len() == self.feature_count {
            Ok(())
        } else {
            Err(ForestError::DimensionMismatch {
                expected: self.feature_count,
                actual: x.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well-separated clusters plus a constant column.
    fn separable() -> (Vec<Vec<f64>>, Vec<Label>) {
        let mut rows = vec![];
        let mut labels = vec![];
        for i in 0..15_u8 {
            let i = f64::from(i);
            rows.push(vec![-2.0 - i * 0.1, 0.0]);
            labels.push(Label::Alive);
            rows.push(vec![2.0 + i * 0.1, 0.0]);
            labels.push(Label::Dead);
        }
        (rows, labels)
    }

    #[test]
    fn test_fit_reproduces_training_labels() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(ForestParams::DEFAULT, &rows, &labels).unwrap();
        assert_eq!(forest.trees().len(), ForestParams::DEFAULT.tree_count);
        assert_eq!(forest.accuracy(&rows, &labels).unwrap(), 1.0);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (rows, labels) = separable();
        let a = RandomForest::fit(ForestParams::DEFAULT, &rows, &labels).unwrap();
        let b = RandomForest::fit(ForestParams::DEFAULT, &rows, &labels).unwrap();
        assert_eq!(a, b);
        for row in &rows {
            assert_eq!(
                a.predict_probability(row).unwrap(),
                b.predict_probability(row).unwrap()
            );
        }
    }

    #[test]
    fn test_different_seed_changes_trees() {
        let (rows, labels) = separable();
        let a = RandomForest::fit(ForestParams::DEFAULT, &rows, &labels).unwrap();
        let params = ForestParams {
            seed: 7,
            ..ForestParams::DEFAULT
        };
        let b = RandomForest::fit(params, &rows, &labels).unwrap();
        assert_ne!(a.trees(), b.trees());
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(ForestParams::DEFAULT, &rows, &labels).unwrap();
        for query in [[-3.0, 0.0], [0.1, 0.0], [3.0, 1.0]] {
            let p = forest.predict_probability(&query).unwrap();
            assert!((p.alive + p.dead - 1.0).abs() < 1e-12);
            assert_eq!(p.confidence(), p.alive.max(p.dead));
            assert_eq!(forest.predict(&query).unwrap(), p.label());
        }
    }

    #[test]
    fn test_single_class_training_set() {
        let rows = vec![vec![1.0], vec![2.0], vec![3.0]];
        let labels = vec![Label::Dead; 3];
        let forest = RandomForest::fit(ForestParams::DEFAULT, &rows, &labels).unwrap();
        let p = forest.predict_probability(&[10.0]).unwrap();
        assert_eq!(p.dead, 1.0);
        assert_eq!(p.label(), Label::Dead);
    }

    #[test]
    fn test_even_vote_resolves_to_dead() {
        let p = ClassProbabilities {
            alive: 0.5,
            dead: 0.5,
        };
        assert_eq!(p.label(), Label::Dead);
        assert_eq!(p.confidence(), 0.5);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let (rows, labels) = separable();
        assert_eq!(
            RandomForest::fit(ForestParams::DEFAULT, &[], &[]).unwrap_err(),
            ForestError::EmptyTrainingSet
        );
        assert_eq!(
            RandomForest::fit(ForestParams::DEFAULT, &rows, &labels[1..]).unwrap_err(),
            ForestError::LengthMismatch {
                rows: 30,
                labels: 29
            }
        );
        let forest = RandomForest::fit(ForestParams::DEFAULT, &rows, &labels).unwrap();
        assert_eq!(
            forest.predict(&[1.0]).unwrap_err(),
            ForestError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_serde_round_trip_is_bit_identical() {
        let (rows, labels) = separable();
        let forest = RandomForest::fit(ForestParams::DEFAULT, &rows, &labels).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, forest);
        let query = [0.37, 0.0];
        assert_eq!(
            restored.predict_probability(&query).unwrap(),
            forest.predict_probability(&query).unwrap()
        );
    }
}
