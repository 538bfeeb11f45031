//! Train/predict pipeline and model persistence for astronaut survival prediction.
//!
//! This crate ties the feature pipeline ([`lifeline_features`]), the classifier
//! ([`lifeline_forest`]) and the rule-based assessments ([`lifeline_assess`]) together behind
//! one in-process boundary, [`service::SurvivalService`].
//!
//! # Training
//!
//! ```text
//! raw records ──▶ TrainingSet (label validation, coercion)
//!             ──▶ FeatureEncoder::fit ──▶ FeatureNormalizer::fit ──▶ RandomForest::fit
//!             ──▶ Snapshot ──▶ ModelStore::save ──▶ swap into the service
//! ```
//!
//! # Inference
//!
//! ```text
//! raw record ──▶ Observation ──▶ encode ──▶ normalize ──▶ vote shares
//!            ──▶ { risk::assess, feedback::generate } ──▶ Prediction
//! ```
//!
//! # State
//!
//! A [`snapshot::Snapshot`] is immutable once built. The service holds a single swappable
//! reference to the current one; inference clones the reference once per request and
//! training swaps it only after the new snapshot has been persisted. A failed training call
//! therefore never disturbs the snapshot in use.
//!
//! # Example
//!
//! ```no_run
//! use lifeline_model::{service::SurvivalService, store::{ModelStore, StoreConfig}};
//! use serde_json::{Map, Value, json};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let service = SurvivalService::new(ModelStore::new(StoreConfig::default()));
//!
//! let records: Vec<Map<String, Value>> = serde_json::from_value(json!([
//!     {"oxygen_level": 21.0, "co2_level": 0.3, "status": "alive"},
//!     {"oxygen_level": 14.0, "co2_level": 2.1, "status": "dead"},
//! ]))?;
//! let stats = service.train(&records)?;
//! println!("trained on {} samples", stats.samples);
//!
//! let query: Map<String, Value> = serde_json::from_value(json!({"oxygen_level": 20.0}))?;
//! let prediction = service.predict(&query)?;
//! println!("{} ({:.1}%)", prediction.astronaut_status, prediction.confidence * 100.0);
//! # Ok(())
//! # }
//! ```

use lifeline_features::observation::SchemaError;

use crate::{snapshot::ModelError, store::StoreError, training::ValidationError};

pub mod prediction;
pub mod service;
pub mod snapshot;
pub mod store;
pub mod training;

pub use lifeline_assess::risk::RiskLevel;
pub use lifeline_features::label::Label;

/// Every way a request to the service can fail. All variants are terminal for the request.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LifelineError {
    #[display("invalid training data: {_0}")]
    Validation(ValidationError),
    #[display("unencodable observation: {_0}")]
    Schema(SchemaError),
    #[display("no trained model is available; train a model first")]
    NotTrained,
    #[display("model error: {_0}")]
    Model(ModelError),
    #[display("{_0}")]
    Store(StoreError),
}

impl LifelineError {
    /// `true` for failures caused by the caller's input rather than by the service.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Schema(_) | Self::NotTrained
        )
    }
}
