use std::fs;

use lifeline_features::normalizer::NormalizeError;
use lifeline_model::{
    Label, LifelineError,
    prediction::ModelInfo,
    service::SurvivalService,
    snapshot::ModelError,
    store::{CURRENT_DIR, ModelStore, PREVIOUS_DIR, StoreConfig},
    training::ValidationError,
};
use serde_json::{Map, Value, json};
use tempfile::TempDir;

fn records(value: Value) -> Vec<Map<String, Value>> {
    serde_json::from_value(value).unwrap()
}

fn record(value: Value) -> Map<String, Value> {
    serde_json::from_value(value).unwrap()
}

fn crew_log() -> Vec<Map<String, Value>> {
    let mut rows = Vec::new();
    for i in 0..10_u8 {
        let step = f64::from(i);
        rows.push(json!({
            "oxygen_level": 20.0 + step * 0.2,
            "co2_level": 0.2 + step * 0.02,
            "radiation": 0.05,
            "food_supply_days": 60.0 + step,
            "status": "alive",
        }));
        rows.push(json!({
            "oxygen_level": 13.0 + step * 0.3,
            "co2_level": 1.5 + step * 0.1,
            "radiation": 0.7 + step * 0.05,
            "water_supply_days": 1.0,
            "status": "dead",
        }));
    }
    records(Value::Array(rows))
}

fn queries() -> Vec<Map<String, Value>> {
    records(json!([
        {"oxygen_level": 21.0, "co2_level": 0.3},
        {"oxygen_level": 17.0, "co2_level": 0.9, "radiation": 0.3},
        {"oxygen_level": 14.0, "co2_level": 2.0, "water_supply_days": 1},
        {"heart_rate": 70},
        {},
    ]))
}

fn service(root: &TempDir) -> SurvivalService {
    SurvivalService::new(ModelStore::new(StoreConfig::new(root.path().join("model"))))
}

#[test]
fn test_reload_gives_bit_identical_predictions() {
    let root = TempDir::new().unwrap();
    let trained = service(&root);
    trained.train(&crew_log()).unwrap();
    let before = queries()
        .iter()
        .map(|p| trained.predict(p).unwrap())
        .collect::<Vec<_>>();
    drop(trained);

    let fresh = service(&root);
    assert!(fresh.is_trained());
    for (query, expected) in queries().iter().zip(&before) {
        let actual = fresh.predict(query).unwrap();
        assert_eq!(actual.astronaut_status, expected.astronaut_status);
        assert_eq!(actual.confidence.to_bits(), expected.confidence.to_bits());
        assert_eq!(actual, *expected);
    }
}

#[test]
fn test_training_is_deterministic() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let a = service(&first);
    let b = service(&second);
    a.train(&crew_log()).unwrap();
    b.train(&crew_log()).unwrap();

    for query in queries() {
        assert_eq!(
            a.predict(&query).unwrap().metrics.prediction_probabilities,
            b.predict(&query).unwrap().metrics.prediction_probabilities
        );
    }
    let classifier = |dir: &TempDir| {
        let path = dir.path().join("model").join(CURRENT_DIR);
        fs::read_to_string(path.join("classifier.json")).unwrap()
    };
    assert_eq!(classifier(&first), classifier(&second));
}

#[test]
fn test_fresh_store_is_untrained() {
    let root = TempDir::new().unwrap();
    let service = service(&root);
    assert!(!service.is_trained());
    assert!(matches!(
        service.model_info().unwrap(),
        ModelInfo::Untrained { .. }
    ));
    let err = service.predict(&queries()[0]).unwrap_err();
    assert!(matches!(err, LifelineError::NotTrained));
}

#[test]
fn test_unseen_fields_do_not_change_prediction() {
    let root = TempDir::new().unwrap();
    let service = service(&root);
    service.train(&crew_log()).unwrap();

    let base = record(json!({"oxygen_level": 21.0, "co2_level": 0.3}));
    let mut noisy = base.clone();
    noisy.insert("suit_serial".to_owned(), json!(991_204));
    noisy.insert("status".to_owned(), json!("dead"));

    let plain = service.predict(&base).unwrap();
    let extended = service.predict(&noisy).unwrap();
    assert_eq!(
        plain.metrics.prediction_probabilities,
        extended.metrics.prediction_probabilities
    );
    assert_eq!(extended.metrics.unknown_fields, ["suit_serial"]);
    assert_eq!(extended.metrics.field_count, 4);
}

#[test]
fn test_fresh_service_recovers_previous_snapshot() {
    let root = TempDir::new().unwrap();
    let trained = service(&root);
    let stats = trained.train(&crew_log()).unwrap();
    let expected = trained.predict(&queries()[1]).unwrap();
    drop(trained);

    let model = root.path().join("model");
    fs::rename(model.join(CURRENT_DIR), model.join(PREVIOUS_DIR)).unwrap();

    let recovered = service(&root);
    assert_eq!(recovered.predict(&queries()[1]).unwrap(), expected);
    let ModelInfo::Trained { training_stats, .. } = recovered.model_info().unwrap() else {
        panic!("recovered service should report a trained model");
    };
    assert_eq!(training_stats, stats);
}

#[test]
fn test_failed_retrain_keeps_committed_snapshot() {
    let root = TempDir::new().unwrap();
    let trained = service(&root);
    let stats = trained.train(&crew_log()).unwrap();

    let mut bad = crew_log();
    bad[0].insert("status".to_owned(), json!("ALIVE"));
    bad[5].remove("status");
    assert!(matches!(
        trained.train(&bad).unwrap_err(),
        LifelineError::Validation(ValidationError::MissingLabel { index: 5 })
    ));
    drop(trained);

    let fresh = service(&root);
    let ModelInfo::Trained { training_stats, .. } = fresh.model_info().unwrap() else {
        panic!("committed snapshot should survive a failed retrain");
    };
    assert_eq!(training_stats, stats);
}

#[test]
fn test_feedback_and_risk_follow_readings() {
    let root = TempDir::new().unwrap();
    let service = service(&root);
    service.train(&crew_log()).unwrap();

    let failing = service
        .predict(&record(json!({
            "oxygen_level": 14.0,
            "co2_level": 2.0,
            "water_supply_days": 1,
        })))
        .unwrap();
    assert_eq!(failing.astronaut_status, Label::Dead);
    assert_eq!(failing.metrics.risk_score, 3 + 3 + 2);
    assert!(failing.feedback[0].contains("CRITICAL"));
    assert!(
        failing
            .feedback
            .last()
            .unwrap()
            .contains("Overall status: CRITICAL")
    );

    let empty = service.predict(&Map::new()).unwrap();
    assert_eq!(empty.feedback[0], "No specific sensor feedback available");
    assert_eq!(empty.feedback.len(), 2);
}

fn overflowing_log() -> Vec<Map<String, Value>> {
    let rows = (0..12_u8)
        .map(|i| {
            let alive = i % 2 == 0;
            json!({
                "oxygen_level": if alive { 21.0 } else { 14.0 },
                "radiation": if alive { 1e200 } else { -1e200 },
                "status": if alive { "alive" } else { "dead" },
            })
        })
        .collect();
    records(Value::Array(rows))
}

#[test]
fn test_overflowing_readings_are_rejected_before_commit() {
    let root = TempDir::new().unwrap();
    let first = service(&root);
    let err = first.train(&overflowing_log()).unwrap_err();
    assert!(matches!(
        err,
        LifelineError::Model(ModelError::Normalize(NormalizeError::NonFinite { column: 1 }))
    ));
    assert!(!first.is_trained());
    assert!(!root.path().join("model").join(CURRENT_DIR).exists());

    let stats = first.train(&crew_log()).unwrap();
    assert!(first.train(&overflowing_log()).is_err());
    drop(first);

    let fresh = service(&root);
    let ModelInfo::Trained { training_stats, .. } = fresh.model_info().unwrap() else {
        panic!("the earlier snapshot should still be committed");
    };
    assert_eq!(training_stats, stats);
    fresh.predict(&queries()[0]).unwrap();
}
