use serde::{Deserialize, Serialize};

/// Descriptive statistics summarizing a column of `f64` values.
///
/// Variance and standard deviation are population statistics (divided by `n`,
/// not `n - 1`), which is what feature standardization expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Number of values in the dataset.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean of the dataset.
    pub mean: f64,
    /// The population variance of the dataset.
    pub variance: f64,
    /// The population standard deviation of the dataset.
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from values in any order.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use lifeline_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.variance, 2.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        Self::from_slice(&values)
    }

    /// Like [`Self::new`], but borrows the values.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let first = *values.first()?;
        let (min, max) = values
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v)));
        let count = values.len();
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        Some(Self {
            count,
            min,
            max,
            mean,
            variance,
            std_dev,
        })
    }

    /// Returns `true` if every value in the dataset was identical.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.min == self.max
    }
}
