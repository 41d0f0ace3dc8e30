// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Saves and restores the fitted Transformer + Classifier pair.
//
// What gets written per training run:
//   1. classifier_config.json    — model config + pair id
//   2. classifier.mpk.gz         — learned weights (Burn recorder)
//   3. transformer.json          — fitted Transformer + pair id
//   4. classifier.json           — classifier manifest + pair id
//   5. train_config.json         — the TrainConfig used
//   6. metrics.json              — holdout metrics
//
// Every run draws a fresh random pair id and stamps it on
// classifier_config.json, transformer.json and classifier.json.
// Loading refuses to proceed unless all three ids agree, the
// classifier expects exactly the transformer's output width, and
// the transformer was fitted over the expected schema.
//
// Each file of a run carries that run's id, so a retrain stopped
// after any one write leaves ids that disagree.
//
// Weights use NamedMpkGzFileRecorder with FullPrecisionSettings:
// the served model scores with exactly the weights that were
// evaluated on the holdout set.
//
// File layout:
//   model/
//     transformer.json
//     classifier.json
//     classifier_config.json
//     classifier.mpk.gz
//     train_config.json
//     metrics.json
//     training_log.csv
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, NdArray},
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::application::train_use_case::TrainConfig;
use crate::data::transformer::FittedTransformer;
use crate::domain::error::{ChurnError, Result as ChurnResult};
use crate::domain::schema::Schema;
use crate::domain::traits::{FittedClassifier, Persistable};
use crate::infra::metrics::HoldoutMetrics;
use crate::ml::inferencer::FittedLogistic;
use crate::ml::model::{LogisticConfig, LogisticModel};

pub const TRANSFORMER_FILE:        &str = "transformer.json";
pub const CLASSIFIER_MANIFEST:     &str = "classifier.json";
pub const CLASSIFIER_CONFIG_FILE:  &str = "classifier_config.json";
pub const CLASSIFIER_WEIGHTS_STEM: &str = "classifier";
pub const TRAIN_CONFIG_FILE:       &str = "train_config.json";
pub const METRICS_FILE:            &str = "metrics.json";

const FORMAT_VERSION: u32 = 1;

type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// transformer.json
#[derive(Debug, Serialize, Deserialize)]
struct TransformerArtifact {
    format_version: u32,
    pair_id:        String,
    transformer:    FittedTransformer,
}

/// classifier.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierManifest {
    pub format_version: u32,
    pub pair_id:        String,
    pub model_type:     String,
    pub n_features:     usize,
}

/// A Transformer and Classifier that were trained together.
#[derive(Debug, Clone)]
pub struct ArtifactPair<C> {
    pub pair_id:     String,
    pub transformer: FittedTransformer,
    pub classifier:  C,
}

/// Reads and writes artifact pairs inside one directory.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a freshly fitted pair under a new pair id and return the id.
    pub fn save_pair<C>(&self, transformer: &FittedTransformer, classifier: &C) -> Result<String>
    where
        C: FittedClassifier + Persistable,
    {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create artifact directory '{}'", self.dir.display()))?;

        let pair_id = format!("{:016x}", rand::random::<u64>());

        classifier.save(&self.dir, &pair_id)?;

        write_json(
            &self.dir.join(TRANSFORMER_FILE),
            &TransformerArtifact {
                format_version: FORMAT_VERSION,
                pair_id:        pair_id.clone(),
                transformer:    transformer.clone(),
            },
        )?;

        write_json(
            &self.dir.join(CLASSIFIER_MANIFEST),
            &ClassifierManifest {
                format_version: FORMAT_VERSION,
                pair_id:        pair_id.clone(),
                model_type:     classifier.model_type().to_string(),
                n_features:     classifier.n_features(),
            },
        )?;

        tracing::info!("Saved artifact pair {} to '{}'", pair_id, self.dir.display());
        Ok(pair_id)
    }

    /// Load both artifacts and verify they belong together.
    pub fn load_pair<C>(&self, schema: &Schema) -> ChurnResult<ArtifactPair<C>>
    where
        C: FittedClassifier + Persistable,
    {
        let t_artifact: TransformerArtifact = read_json(&self.dir.join(TRANSFORMER_FILE))?;
        let manifest: ClassifierManifest = read_json(&self.dir.join(CLASSIFIER_MANIFEST))?;

        let fail = |reason: String| ChurnError::artifact_load(self.dir.display().to_string(), reason);

        if t_artifact.format_version != FORMAT_VERSION || manifest.format_version != FORMAT_VERSION {
            return Err(fail(format!(
                "unsupported format version (transformer {}, classifier {}, expected {FORMAT_VERSION})",
                t_artifact.format_version, manifest.format_version
            )));
        }
        if t_artifact.pair_id != manifest.pair_id {
            return Err(fail(format!(
                "mismatched pair: transformer {} vs classifier {}",
                t_artifact.pair_id, manifest.pair_id
            )));
        }

        let transformer = t_artifact.transformer;
        if !transformer.matches_schema(schema) {
            return Err(fail("transformer was fitted over a different schema".to_string()));
        }

        let (classifier, classifier_pair) = C::load(&self.dir)?;
        if classifier_pair != manifest.pair_id {
            return Err(fail(format!(
                "mismatched pair: classifier weights {} vs manifest {}",
                classifier_pair, manifest.pair_id
            )));
        }
        if manifest.model_type != classifier.model_type() {
            return Err(fail(format!(
                "manifest names model type '{}' but '{}' was requested",
                manifest.model_type,
                classifier.model_type()
            )));
        }
        if classifier.n_features() != manifest.n_features || manifest.n_features != transformer.feature_len() {
            return Err(fail(format!(
                "feature width mismatch: transformer emits {}, classifier expects {}",
                transformer.feature_len(),
                classifier.n_features()
            )));
        }

        tracing::info!(
            "Loaded artifact pair {} ({} features) from '{}'",
            manifest.pair_id,
            transformer.feature_len(),
            self.dir.display()
        );

        Ok(ArtifactPair { pair_id: manifest.pair_id, transformer, classifier })
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        write_json(&self.dir.join(TRAIN_CONFIG_FILE), cfg)?;
        tracing::debug!("Saved training config to '{}'", self.dir.display());
        Ok(())
    }

    pub fn load_config(&self) -> ChurnResult<TrainConfig> {
        read_json(&self.dir.join(TRAIN_CONFIG_FILE))
    }

    pub fn save_metrics(&self, metrics: &HoldoutMetrics) -> Result<()> {
        write_json(&self.dir.join(METRICS_FILE), metrics)
    }

    pub fn load_metrics(&self) -> ChurnResult<HoldoutMetrics> {
        read_json(&self.dir.join(METRICS_FILE))
    }
}

// ─── Classifier persistence ───────────────────────────────────────────────────
/// classifier_config.json
#[derive(Debug, Serialize, Deserialize)]
struct LogisticArtifact {
    pair_id: String,
    config:  LogisticConfig,
}

impl Persistable for FittedLogistic {
    fn save(&self, dir: &Path, pair_id: &str) -> Result<()> {
        // Stamped config first, so no older manifest matches half-written weights
        write_json(
            &dir.join(CLASSIFIER_CONFIG_FILE),
            &LogisticArtifact { pair_id: pair_id.to_string(), config: self.config().clone() },
        )?;

        let device = NdArrayDevice::default();
        let model = self.config().init_with::<NdArray>(self.weights(), self.bias(), &device);

        let path = dir.join(CLASSIFIER_WEIGHTS_STEM);
        WeightsRecorder::new()
            .record(model.into_record(), path.clone())
            .with_context(|| format!("Failed to save classifier weights to '{}'", path.display()))?;
        Ok(())
    }

    fn load(dir: &Path) -> ChurnResult<(Self, String)> {
        let device = NdArrayDevice::default();
        let LogisticArtifact { pair_id, config } = read_json(&dir.join(CLASSIFIER_CONFIG_FILE))?;

        let path = dir.join(CLASSIFIER_WEIGHTS_STEM);
        let record: <LogisticModel<NdArray> as Module<NdArray>>::Record = WeightsRecorder::new()
            .load(path.clone(), &device)
            .map_err(|e| ChurnError::artifact_load(path.display().to_string(), format!("{e:?}")))?;

        let model = config.init::<NdArray>(&device).load_record(record);
        let (weights, bias) = model
            .parameters()
            .map_err(|e| ChurnError::artifact_load(path.display().to_string(), e.to_string()))?;

        if weights.len() != config.n_features {
            return Err(ChurnError::artifact_load(
                path.display().to_string(),
                format!("{} weights stored for {} features", weights.len(), config.n_features),
            ));
        }

        Ok((FittedLogistic::new(config, weights, bias), pair_id))
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ChurnResult<T> {
    let json = fs::read_to_string(path).map_err(|e| {
        ChurnError::artifact_load(
            path.display().to_string(),
            format!("{e}. Have you run 'train' first?"),
        )
    })?;
    serde_json::from_str(&json)
        .map_err(|e| ChurnError::artifact_load(path.display().to_string(), e.to_string()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::training_records;
    use crate::data::transformer::Transformer;
    use crate::domain::traits::Classifier;
    use crate::ml::trainer::LogisticRegression;

    fn fitted_pair() -> (FittedTransformer, FittedLogistic) {
        let (rows, labels) = training_records();
        let t = Transformer::new(Schema::telco()).fit(&rows).unwrap();
        let x = t.transform_batch(&rows).unwrap();
        let quick = LogisticRegression { epochs: 20, ..Default::default() };
        let c = quick.fit(&x, &labels).unwrap();
        (t, c)
    }

    #[test]
    fn test_pair_round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (t, c) = fitted_pair();

        let id = store.save_pair(&t, &c).unwrap();
        let pair: ArtifactPair<FittedLogistic> = store.load_pair(&Schema::telco()).unwrap();

        assert_eq!(pair.pair_id, id);
        assert_eq!(pair.transformer, t);
        assert_eq!(pair.classifier.weights(), c.weights());
        assert_eq!(pair.classifier.bias(), c.bias());
    }

    #[test]
    fn test_missing_artifacts_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.load_pair::<FittedLogistic>(&Schema::telco()).unwrap_err();
        assert!(matches!(err, ChurnError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_mismatched_pair_is_rejected() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let (t, c) = fitted_pair();
        ArtifactStore::new(a.path()).save_pair(&t, &c).unwrap();
        ArtifactStore::new(b.path()).save_pair(&t, &c).unwrap();

        // Transformer from run A next to classifier from run B
        fs::copy(a.path().join(TRANSFORMER_FILE), b.path().join(TRANSFORMER_FILE)).unwrap();

        let err = ArtifactStore::new(b.path())
            .load_pair::<FittedLogistic>(&Schema::telco())
            .unwrap_err();
        assert!(err.to_string().contains("mismatched pair"));
    }

    #[test]
    fn test_classifier_overwritten_alone_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (t, c) = fitted_pair();
        store.save_pair(&t, &c).unwrap();

        // A retrain that stopped right after writing its classifier files
        let (rows, labels) = training_records();
        let x = t.transform_batch(&rows).unwrap();
        let retrained = LogisticRegression { epochs: 5, ..Default::default() }.fit(&x, &labels).unwrap();
        retrained.save(dir.path(), "00000000000000ff").unwrap();

        let err = store.load_pair::<FittedLogistic>(&Schema::telco()).unwrap_err();
        assert!(matches!(err, ChurnError::ArtifactLoad { .. }));
        assert!(err.to_string().contains("mismatched pair"));
    }

    #[test]
    fn test_stopped_after_config_write_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (t, c) = fitted_pair();
        store.save_pair(&t, &c).unwrap();

        // New config stamped, old weights still on disk
        write_json(
            &dir.path().join(CLASSIFIER_CONFIG_FILE),
            &LogisticArtifact { pair_id: "00000000000000ff".into(), config: c.config().clone() },
        )
        .unwrap();

        let err = store.load_pair::<FittedLogistic>(&Schema::telco()).unwrap_err();
        assert!(matches!(err, ChurnError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_classifier_load_returns_its_pair_id() {
        let dir = tempfile::tempdir().unwrap();
        let (_, c) = fitted_pair();
        c.save(dir.path(), "0123456789abcdef").unwrap();

        let (loaded, id) = FittedLogistic::load(dir.path()).unwrap();
        assert_eq!(id, "0123456789abcdef");
        assert_eq!(loaded.weights(), c.weights());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let cfg = TrainConfig::default();
        store.save_config(&cfg).unwrap();
        assert_eq!(store.load_config().unwrap(), cfg);
    }
}
