//! Random forest classifier for the binary survival status.
//!
//! # How Training Works
//!
//! 1. **Seeding** - A master [`rand_pcg::Pcg32`] seeded with [`params::RANDOM_SEED`] draws one
//!    seed per tree, so the same training set always yields the same forest
//! 2. **Bootstrap** - Each tree draws as many rows as the training set holds, with replacement
//! 3. **Growing** - Each tree is grown on its bootstrap sample with randomized feature subsets
//!    (see [`tree`])
//! 4. **Parallelism** - Trees are independent and are grown on scoped threads
//!
//! # Prediction
//!
//! Every tree casts one vote. [`forest::RandomForest::predict_probability`] reports the share of
//! votes per class, and the confidence of a prediction is the larger share. An even vote
//! resolves to [`Label::Dead`](lifeline_features::label::Label::Dead).
//!
//! # Example
//!
//! ```
//! use lifeline_features::label::Label;
//! use lifeline_forest::{forest::RandomForest, params::ForestParams};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let rows = (0..20_u8).map(|i| vec![f64::from(i)]).collect::<Vec<_>>();
//! let labels = (0..20_u8)
//!     .map(|i| if i < 10 { Label::Alive } else { Label::Dead })
//!     .collect::<Vec<_>>();
//!
//! let forest = RandomForest::fit(ForestParams::DEFAULT, &rows, &labels)?;
//! let probabilities = forest.predict_probability(&[2.0])?;
//! assert_eq!(probabilities.label(), Label::Alive);
//! assert!(probabilities.confidence() > 0.5);
//! # Ok(())
//! # }
//! ```
//!
//! # Current Limitations
//!
//! - **Hyperparameters are fixed**: [`params::ForestParams::DEFAULT`] is used as-is; there is no
//!   search over tree count or depth
//! - **Vote shares, not leaf probabilities**: Probabilities are the fraction of trees voting for
//!   a class, which is coarser than averaging per-leaf class frequencies

pub mod forest;
pub mod params;
pub mod tree;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ForestError {
    #[display("cannot fit a forest on an empty training set")]
    EmptyTrainingSet,
    #[display("cannot fit a forest with zero trees")]
    NoTrees,
    #[display("training set has {rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[display("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[display("tree {tree} is corrupt at node {node}")]
    CorruptTree { tree: usize, node: usize },
}
