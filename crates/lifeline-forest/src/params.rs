use serde::{Deserialize, Serialize};

/// Number of trees in the ensemble.
pub const TREE_COUNT: usize = 100;
/// Maximum depth of every tree (the root is at depth 0).
pub const MAX_DEPTH: usize = 10;
/// Nodes with fewer samples than this become leaves.
pub const MIN_SAMPLES_SPLIT: usize = 5;
/// Seed of the master RNG that derives every per-tree seed.
pub const RANDOM_SEED: u64 = 42;

/// Fixed forest hyperparameters.
///
/// These are chosen for small-to-medium tabular data and are not tuned at runtime. The struct
/// exists so the values travel with a persisted model and can be reported back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub tree_count: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl ForestParams {
    pub const DEFAULT: Self = Self {
        tree_count: TREE_COUNT,
        max_depth: MAX_DEPTH,
        min_samples_split: MIN_SAMPLES_SPLIT,
        seed: RANDOM_SEED,
    };

    /// Number of candidate features examined at each split: `max(1, floor(sqrt(n)))`.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn features_per_split(feature_count: usize) -> usize {
        ((feature_count as f64).sqrt() as usize).max(1)
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}
