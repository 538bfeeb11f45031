//! On-disk persistence of [`Snapshot`]s.
//!
//! A store root holds at most these entries:
//!
//! ```text
//! <root>/
//! ├── current/              committed snapshot
//! │   ├── encoder.json
//! │   ├── normalizer.json
//! │   ├── classifier.json
//! │   └── training_stats.json
//! ├── previous/             prior snapshot, only while a commit is in flight
//! └── .staging-<pid>/       snapshot being written
//! ```
//!
//! [`ModelStore::save`] writes every artifact into the staging directory first and then commits
//! with directory renames, so a reader never observes a mix of old and new artifacts. If the
//! process dies between moving `current/` aside and renaming the staging directory into place,
//! [`ModelStore::load`] falls back to `previous/`.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
    process,
};

use lifeline_features::{encoder::FeatureEncoder, normalizer::FeatureNormalizer};
use lifeline_forest::forest::RandomForest;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::snapshot::{ModelError, Snapshot, TrainingStats};

pub const CURRENT_DIR: &str = "current";
pub const PREVIOUS_DIR: &str = "previous";

const ENCODER_FILE: &str = "encoder.json";
const NORMALIZER_FILE: &str = "normalizer.json";
const CLASSIFIER_FILE: &str = "classifier.json";
const TRAINING_STATS_FILE: &str = "training_stats.json";

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StoreError {
    #[display("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[display("malformed model artifact {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("inconsistent model snapshot in {}: {source}", path.display())]
    Inconsistent { path: PathBuf, source: ModelError },
}

impl StoreError {
    fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_owned();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory that holds the snapshot directories.
    pub root: PathBuf,
}

impl StoreConfig {
    pub const DEFAULT_ROOT: &str = "model";

    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROOT)
    }
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    config: StoreConfig,
}

impl ModelStore {
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// `true` if a committed (or recoverable) snapshot is on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.current_dir().is_dir() || self.previous_dir().is_dir()
    }

    fn current_dir(&self) -> PathBuf {
        self.config.root.join(CURRENT_DIR)
    }

    fn previous_dir(&self) -> PathBuf {
        self.config.root.join(PREVIOUS_DIR)
    }

    /// Persists `snapshot`, fully replacing whatever was committed before.
    ///
    /// The snapshot is validated first, so nothing is written for a snapshot that
    /// [`Self::load`] would reject.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let root = self.root();
        snapshot
            .validate()
            .map_err(|source| StoreError::Inconsistent {
                path: root.to_owned(),
                source,
            })?;
        fs::create_dir_all(root).map_err(StoreError::io("create directory", root))?;

        let staging = root.join(format!(".staging-{}", process::id()));
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(StoreError::io("remove", &staging))?;
        }
        fs::create_dir(&staging).map_err(StoreError::io("create directory", &staging))?;
        if let Err(e) = write_artifacts(&staging, snapshot) {
            remove_staging(&staging);
            return Err(e);
        }

        let current = self.current_dir();
        let previous = self.previous_dir();
        if current.is_dir() {
            if previous.exists() {
                fs::remove_dir_all(&previous).map_err(StoreError::io("remove", &previous))?;
            }
            fs::rename(&current, &previous).map_err(StoreError::io("move aside", &current))?;
        }
        if let Err(e) = fs::rename(&staging, &current) {
            remove_staging(&staging);
            return Err(StoreError::io("commit", &staging)(e));
        }
        if previous.exists() {
            if let Err(e) = fs::remove_dir_all(&previous) {
                tracing::warn!(
                    path = %previous.display(),
                    error = %e,
                    "failed to remove previous snapshot"
                );
            }
        }

        tracing::info!(
            path = %current.display(),
            samples = snapshot.stats().samples,
            features = snapshot.stats().features,
            "model snapshot saved"
        );
        Ok(())
    }

    /// Loads the committed snapshot, or `None` when nothing has been saved yet.
    ///
    /// A present but unreadable `current/` is an error; `previous/` is only consulted when
    /// `current/` is missing.
    pub fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let current = self.current_dir();
        let dir = if current.is_dir() {
            current
        } else {
            let previous = self.previous_dir();
            if !previous.is_dir() {
                tracing::debug!(root = %self.root().display(), "no model snapshot on disk");
                return Ok(None);
            }
            tracing::warn!(
                path = %previous.display(),
                "committed snapshot missing; recovering the previous one"
            );
            previous
        };

        let snapshot = read_snapshot(&dir)?;
        tracing::info!(
            path = %dir.display(),
            samples = snapshot.stats().samples,
            features = snapshot.stats().features,
            "model snapshot loaded"
        );
        Ok(Some(snapshot))
    }
}

fn remove_staging(staging: &Path) {
    if let Err(e) = fs::remove_dir_all(staging) {
        tracing::warn!(
            path = %staging.display(),
            error = %e,
            "failed to remove staging directory"
        );
    }
}

fn write_artifacts(dir: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    write_json(&dir.join(ENCODER_FILE), snapshot.encoder())?;
    write_json(&dir.join(NORMALIZER_FILE), snapshot.normalizer())?;
    write_json(&dir.join(CLASSIFIER_FILE), snapshot.forest())?;
    write_json(&dir.join(TRAINING_STATS_FILE), snapshot.stats())?;
    Ok(())
}

fn read_snapshot(dir: &Path) -> Result<Snapshot, StoreError> {
    let encoder: FeatureEncoder = read_json(&dir.join(ENCODER_FILE))?;
    let normalizer: FeatureNormalizer = read_json(&dir.join(NORMALIZER_FILE))?;
    let forest: RandomForest = read_json(&dir.join(CLASSIFIER_FILE))?;
    let stats: TrainingStats = read_json(&dir.join(TRAINING_STATS_FILE))?;
    Snapshot::from_parts(encoder, normalizer, forest, stats).map_err(|source| {
        StoreError::Inconsistent {
            path: dir.to_owned(),
            source,
        }
    })
}

fn write_json<T>(path: &Path, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
{
    let file = File::create(path).map_err(StoreError::io("create", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| StoreError::Json {
        path: path.to_owned(),
        source,
    })?;
    writer.flush().map_err(StoreError::io("write", path))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(StoreError::io("sync", path))?;
    Ok(())
}

fn read_json<T>(path: &Path) -> Result<T, StoreError>
where
    T: DeserializeOwned,
{
    let file = File::open(path).map_err(StoreError::io("open", path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Json {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use lifeline_forest::params::ForestParams;
    use tempfile::TempDir;

    use super::*;
    use crate::{snapshot::tests::sample_records, training::TrainingSet};

    fn snapshot() -> Snapshot {
        let set = TrainingSet::from_records(&sample_records()).unwrap();
        Snapshot::fit(&set, ForestParams::DEFAULT).unwrap()
    }

    fn store(dir: &TempDir) -> ModelStore {
        ModelStore::new(StoreConfig::new(dir.path().join("model")))
    }

    #[test]
    fn test_load_without_snapshot_is_none() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(!store.exists());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let saved = snapshot();
        store.save(&saved).unwrap();

        assert!(store.exists());
        assert!(store.root().join(CURRENT_DIR).join(CLASSIFIER_FILE).is_file());
        assert!(!store.root().join(PREVIOUS_DIR).exists());
        assert_eq!(store.load().unwrap().unwrap(), saved);
    }

    #[test]
    fn test_resave_replaces_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&snapshot()).unwrap();
        let second = snapshot();
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap().unwrap(), second);
        let entries = fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(entries, [CURRENT_DIR]);
    }

    #[test]
    fn test_recovers_previous_after_interrupted_commit() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let saved = snapshot();
        store.save(&saved).unwrap();
        fs::rename(
            store.root().join(CURRENT_DIR),
            store.root().join(PREVIOUS_DIR),
        )
        .unwrap();

        assert!(store.exists());
        assert_eq!(store.load().unwrap().unwrap(), saved);

        let next = snapshot();
        store.save(&next).unwrap();
        assert!(!store.root().join(PREVIOUS_DIR).exists());
        assert_eq!(store.load().unwrap().unwrap(), next);
    }

    #[test]
    fn test_corrupt_artifact_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&snapshot()).unwrap();
        let path = store.root().join(CURRENT_DIR).join(NORMALIZER_FILE);
        fs::write(&path, "{ not json").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(&err, StoreError::Json { path: p, .. } if *p == path));
        assert!(err.to_string().contains(NORMALIZER_FILE));
    }

    #[test]
    fn test_failed_commit_removes_staging() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.root()).unwrap();
        // a plain file where the snapshot directory belongs makes the rename fail
        fs::write(store.root().join(CURRENT_DIR), "").unwrap();

        let err = store.save(&snapshot()).unwrap_err();
        assert!(matches!(err, StoreError::Io { action: "commit", .. }));
        let entries = fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(entries, [CURRENT_DIR]);
    }

    #[test]
    fn test_missing_artifact_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&snapshot()).unwrap();
        fs::remove_file(store.root().join(CURRENT_DIR).join(ENCODER_FILE)).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Io { action: "open", .. }));
    }
}
