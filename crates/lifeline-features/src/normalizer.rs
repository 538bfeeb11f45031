//! Per-feature standardization.
//!
//! [`FeatureNormalizer::fit`] captures the mean and population standard deviation of every
//! column of the training matrix. [`FeatureNormalizer::transform`] then maps each value to
//! `(x - mean) / std_dev`.
//!
//! # Degenerate Features
//!
//! A column that was constant during training has `std_dev == 0`. Such a column carries no
//! information, so it normalizes to `0.0` for every input instead of dividing by zero.
//!
//! Finite but huge readings can still overflow the variance. Fitting fails with
//! [`NormalizeError::NonFinite`] in that case, since such statistics can neither standardize
//! anything nor be written to JSON.

use lifeline_stats::descriptive::DescriptiveStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum NormalizeError {
    #[display("cannot fit normalization statistics on an empty matrix")]
    EmptyMatrix,
    #[display("expected a vector of {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[display("statistics of feature column {column} overflow to a non-finite value")]
    NonFinite { column: usize },
}

/// Fitted per-column statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureNormalizer {
    columns: Vec<DescriptiveStats>,
}

impl FeatureNormalizer {
    /// Computes per-column statistics over `matrix`.
    ///
    /// Every row must have the same length as the first one.
    pub fn fit(matrix: &[Vec<f64>]) -> Result<Self, NormalizeError> {
        let first = matrix.first().ok_or(NormalizeError::EmptyMatrix)?;
        let dimension = first.len();
        if let Some(row) = matrix.iter().find(|row| row.len() != dimension) {
            return Err(NormalizeError::DimensionMismatch {
                expected: dimension,
                actual: row.len(),
            });
        }

        let columns = (0..dimension)
            .map(|i| {
                DescriptiveStats::new(matrix.iter().map(|row| row[i]))
                    .ok_or(NormalizeError::EmptyMatrix)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let normalizer = Self { columns };
        normalizer.validate()?;

        let constant = normalizer
            .columns
            .iter()
            .filter(|c| c.std_dev == 0.0)
            .count();
        tracing::debug!(
            features = dimension,
            rows = matrix.len(),
            constant,
            "normalization statistics fitted"
        );
        Ok(normalizer)
    }

    /// Checks that every column's statistics are finite.
    pub fn validate(&self) -> Result<(), NormalizeError> {
        let overflowed = self.columns.iter().position(|stats| {
            [stats.min, stats.max, stats.mean, stats.variance, stats.std_dev]
                .iter()
                .any(|v| !v.is_finite())
        });
        match overflowed {
            Some(column) => Err(NormalizeError::NonFinite { column }),
            None => Ok(()),
        }
    }

    /// Number of features the statistics were fitted on.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[DescriptiveStats] {
        &self.columns
    }

    /// Standardizes a single encoded vector.
    pub fn transform(&self, vector: &[f64]) -> Result<Vec<f64>, NormalizeError> {
        if vector.len() != self.columns.len() {
            return Err(NormalizeError::DimensionMismatch {
                expected: self.columns.len(),
                actual: vector.len(),
            });
        }
        Ok(vector
            .iter()
            .zip(&self.columns)
            .map(|(x, stats)| standardize(*x, stats))
            .collect())
    }

    pub fn transform_all(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, NormalizeError> {
        matrix.iter().map(|row| self.transform(row)).collect()
    }
}

fn standardize(x: f64, stats: &DescriptiveStats) -> f64 {
    if stats.std_dev == 0.0 {
        0.0
    } else {
        (x - stats.mean) / stats.std_dev
    }
}
