//! Turning schema-free sensor records into fixed numeric feature vectors.
//!
//! Training and inference both start from raw JSON objects whose set of fields is not known
//! in advance. This crate owns every step that happens before the classifier sees a vector:
//!
//! 1. **Coerce** ([`observation::Observation`]): Raw JSON values become finite `f64` readings
//! 2. **Encode** ([`encoder::FeatureEncoder`]): Readings are placed into slots of a vocabulary
//!    fixed at training time
//! 3. **Normalize** ([`normalizer::FeatureNormalizer`]): Each slot is standardized with the
//!    mean and standard deviation captured at training time
//!
//! [`label::Label`] is the binary survival status carried by training records.
//!
//! # Example
//!
//! ```
//! use lifeline_features::{
//!     encoder::FeatureEncoder, normalizer::FeatureNormalizer, observation::Observation,
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let training = vec![
//!     Observation::from_iter([("oxygen_level", 21.0), ("co2_level", 0.3)]),
//!     Observation::from_iter([("oxygen_level", 15.0), ("radiation", 0.9)]),
//! ];
//! let encoder = FeatureEncoder::fit(&training);
//! assert_eq!(encoder.vocabulary().names(), ["co2_level", "oxygen_level", "radiation"]);
//!
//! let matrix = encoder.transform_all(&training);
//! let normalizer = FeatureNormalizer::fit(&matrix)?;
//!
//! // Unknown fields are dropped, missing ones encode as 0
//! let query = Observation::from_iter([("oxygen_level", 18.0), ("humidity", 40.0)]);
//! let vector = normalizer.transform(&encoder.transform(&query))?;
//! assert_eq!(vector.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod encoder;
pub mod label;
pub mod normalizer;
pub mod observation;
