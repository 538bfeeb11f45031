use std::sync::{Arc, Mutex, PoisonError, RwLock};

use lifeline_features::{label::LABEL_FIELD, observation::Observation};
use lifeline_forest::params::ForestParams;
use serde_json::{Map, Value};

use crate::{
    LifelineError,
    prediction::{ModelInfo, Prediction},
    snapshot::{Snapshot, TrainingStats},
    store::ModelStore,
    training::TrainingSet,
};

/// Trains and serves one model snapshot.
///
/// `predict` and `model_info` may run concurrently with each other and with `train`; they take
/// a reference to the current snapshot up front and keep using it even if a training call
/// swaps in a new one meanwhile. Training calls are serialized.
#[derive(Debug)]
pub struct SurvivalService {
    store: ModelStore,
    current: RwLock<Option<Arc<Snapshot>>>,
    training: Mutex<()>,
}

impl SurvivalService {
    #[must_use]
    pub fn new(store: ModelStore) -> Self {
        Self {
            store,
            current: RwLock::new(None),
            training: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Fits a new snapshot on `records`, persists it and makes it current.
    ///
    /// On any error the previously committed snapshot stays in place, both in memory and on
    /// disk.
    pub fn train(&self, records: &[Map<String, Value>]) -> Result<TrainingStats, LifelineError> {
        let _guard = self
            .training
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let set = TrainingSet::from_records(records).map_err(LifelineError::Validation)?;
        let snapshot = Snapshot::fit(&set, ForestParams::DEFAULT).map_err(LifelineError::Model)?;
        self.store.save(&snapshot).map_err(LifelineError::Store)?;

        let stats = snapshot.stats().clone();
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(snapshot));
        Ok(stats)
    }

    /// Predicts survival for one raw record.
    ///
    /// A `status` field in the record, if any, is ignored.
    pub fn predict(&self, record: &Map<String, Value>) -> Result<Prediction, LifelineError> {
        let snapshot = self.snapshot()?.ok_or(LifelineError::NotTrained)?;
        let observation = Observation::from_record_excluding(record, &[LABEL_FIELD])
            .map_err(LifelineError::Schema)?;
        let provided_fields = record.keys().cloned().collect::<Vec<_>>();

        let prediction = Prediction::evaluate(&snapshot, provided_fields, &observation)
            .map_err(LifelineError::Model)?;
        tracing::debug!(
            status = %prediction.astronaut_status,
            confidence = prediction.confidence,
            risk = %prediction.risk_level,
            fields = prediction.metrics.field_count,
            unknown = prediction.metrics.unknown_fields.len(),
            "prediction served"
        );
        Ok(prediction)
    }

    pub fn model_info(&self) -> Result<ModelInfo, LifelineError> {
        Ok(self
            .snapshot()?
            .map_or_else(ModelInfo::untrained, |snapshot| {
                ModelInfo::from_snapshot(&snapshot)
            }))
    }

    /// `true` if a snapshot is in memory or could be loaded from the store.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        let loaded = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        loaded || self.store.exists()
    }

    /// Returns the current snapshot, loading it from the store on first use.
    fn snapshot(&self) -> Result<Option<Arc<Snapshot>>, LifelineError> {
        if let Some(snapshot) = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Some(Arc::clone(snapshot)));
        }

        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = current.as_ref() {
            return Ok(Some(Arc::clone(snapshot)));
        }
        let loaded = self
            .store
            .load()
            .map_err(LifelineError::Store)?
            .map(Arc::new);
        current.clone_from(&loaded);
        Ok(loaded)
    }
}
