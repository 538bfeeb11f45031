//! Statistical helpers shared by the Lifeline crates.
//!
//! - [`descriptive`]: Descriptive statistics (mean, variance, standard deviation, range)
//!   used to fit feature normalization.
//!
//! # Examples
//!
//! ```
//! use lifeline_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```

pub mod descriptive;
