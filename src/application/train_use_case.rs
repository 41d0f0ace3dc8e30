// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the labelled CSV        (Layer 4 - data)
//   Step 2: Fit the Transformer          (Layer 4 - data)
//   Step 3: Transform every row          (Layer 4 - data)
//   Step 4: Split train/holdout          (Layer 4 - data)
//   Step 5: Save config                  (Layer 6 - infra)
//   Step 6: Fit the Classifier           (Layer 5 - ml)
//   Step 7: Score the holdout partition  (Layer 6 - infra)
//   Step 8: Save the artifact pair       (Layer 6 - infra)
//
// The Transformer is fitted on all rows before the split; the
// Classifier only ever sees the training partition.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{loader::CsvLoader, splitter::split_train_holdout, transformer::Transformer};
use crate::domain::record::FeatureVector;
use crate::domain::schema::Schema;
use crate::domain::traits::{Classifier, FittedClassifier, Persistable, RecordSource};
use crate::infra::{
    checkpoint::ArtifactStore,
    metrics::{HoldoutMetrics, TrainingLog},
};
use crate::ml::trainer::LogisticRegression;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run depends on. Saved next to the artifacts
// as train_config.json so a run can be reproduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:     String,
    pub artifact_dir:  String,
    pub test_fraction: f64,
    pub seed:          u64,
    pub epochs:        usize,
    pub learning_rate: f64,
    pub l2_penalty:    f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:     "data/telco_churn.csv".to_string(),
            artifact_dir:  "model".to_string(),
            test_fraction: 0.2,
            seed:          42,
            epochs:        200,
            learning_rate: 0.05,
            l2_penalty:    1e-4,
        }
    }
}

impl TrainConfig {
    /// The default classifier, parameterised from this config.
    pub fn classifier(&self) -> LogisticRegression {
        LogisticRegression {
            epochs:        self.epochs,
            learning_rate: self.learning_rate,
            l2_penalty:    self.l2_penalty,
        }
    }
}

/// Summary of a finished run, printed by the CLI.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub pair_id:     String,
    pub rows:        usize,
    pub imputed:     usize,
    pub median:      f64,
    pub feature_len: usize,
    pub train_rows:  usize,
    pub metrics:     HoldoutMetrics,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
    schema: Schema,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, schema: Schema::telco() }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Train the configured logistic regression end to end.
    pub fn execute(&self) -> Result<TrainReport> {
        let classifier = self.config.classifier();
        self.execute_with(&classifier)
    }

    /// Run the pipeline with any Classifier whose fitted form can be saved.
    pub fn execute_with<C>(&self, classifier: &C) -> Result<TrainReport>
    where
        C: Classifier,
        C::Fitted: Persistable,
    {
        let cfg = &self.config;
        if !(cfg.test_fraction > 0.0 && cfg.test_fraction < 1.0) {
            bail!("test fraction must lie strictly between 0 and 1, got {}", cfg.test_fraction);
        }

        // ── Step 1: Load the labelled CSV ─────────────────────────────────────
        tracing::info!("Loading training data from '{}'", cfg.data_path);
        let batch = CsvLoader::new(&cfg.data_path, self.schema.clone())
            .load()
            .with_context(|| format!("Failed to load training data from '{}'", cfg.data_path))?;
        let labels = batch
            .labels
            .clone()
            .context("training data carries no Churn labels")?;

        // ── Step 2: Fit the Transformer on every row ─────────────────────────
        let transformer = Transformer::new(self.schema.clone()).fit(&batch.records)?;
        tracing::info!("Transformer emits {} features", transformer.feature_len());

        // ── Step 3: Transform ────────────────────────────────────────────────
        let features = transformer.transform_batch(&batch.records)?;

        // ── Step 4: Seeded train/holdout split ───────────────────────────────
        let samples: Vec<(FeatureVector, bool)> = features.into_iter().zip(labels).collect();
        let (train, holdout) = split_train_holdout(samples, cfg.test_fraction, cfg.seed);
        if train.is_empty() || holdout.is_empty() {
            bail!(
                "{} rows are too few to split with test fraction {}",
                batch.len(),
                cfg.test_fraction
            );
        }
        tracing::info!("Train: {} rows | Holdout: {} rows", train.len(), holdout.len());

        let (train_x, train_y): (Vec<FeatureVector>, Vec<bool>) = train.into_iter().unzip();
        let (hold_x, hold_y): (Vec<FeatureVector>, Vec<bool>) = holdout.into_iter().unzip();

        // ── Step 5: Save config ──────────────────────────────────────────────
        let store = ArtifactStore::new(&cfg.artifact_dir);
        store.save_config(cfg)?;

        // ── Step 6: Fit the Classifier ───────────────────────────────────────
        tracing::info!("Fitting classifier on {} rows", train_x.len());
        let fitted = classifier.fit(&train_x, &train_y)?;

        // ── Step 7: Holdout metrics ──────────────────────────────────────────
        let probabilities = fitted.predict_proba(&hold_x)?;
        let metrics = HoldoutMetrics::compute(&probabilities, &hold_y);
        tracing::info!(
            "Holdout accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1
        );

        // ── Step 8: Persist the pair and its records ─────────────────────────
        let pair_id = store.save_pair(&transformer, &fitted)?;
        store.save_metrics(&metrics)?;

        let losses = fitted.training_loss();
        if !losses.is_empty() {
            let log = TrainingLog::create(store.dir())?;
            log.append(losses)?;
        }

        Ok(TrainReport {
            pair_id,
            rows:        batch.len(),
            imputed:     batch.imputed,
            median:      batch.median,
            feature_len: transformer.feature_len(),
            train_rows:  train_x.len(),
            metrics,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::training_csv;
    use crate::infra::checkpoint::{ArtifactPair, METRICS_FILE, TRAIN_CONFIG_FILE};
    use crate::ml::inferencer::FittedLogistic;
    use std::{fs, path::Path};

    fn config(dir: &Path) -> TrainConfig {
        let data = dir.join("telco.csv");
        fs::write(&data, training_csv()).unwrap();
        TrainConfig {
            data_path:    data.display().to_string(),
            artifact_dir: dir.join("model").display().to_string(),
            epochs:       60,
            ..Default::default()
        }
    }

    #[test]
    fn test_pipeline_writes_loadable_pair() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();

        assert_eq!(report.rows, 60);
        assert_eq!(report.imputed, 1);
        // 20% of 60 rows held out
        assert_eq!(report.metrics.support, 12);
        assert_eq!(report.train_rows, 48);

        let store = ArtifactStore::new(&cfg.artifact_dir);
        let pair: ArtifactPair<FittedLogistic> = store.load_pair(&Schema::telco()).unwrap();
        assert_eq!(pair.pair_id, report.pair_id);
        assert_eq!(pair.transformer.feature_len(), report.feature_len);
        assert_eq!(store.load_config().unwrap(), cfg);
        assert_eq!(store.load_metrics().unwrap(), report.metrics);

        let model_dir = Path::new(&cfg.artifact_dir);
        assert!(model_dir.join(TRAIN_CONFIG_FILE).exists());
        assert!(model_dir.join(METRICS_FILE).exists());
        let log = fs::read_to_string(model_dir.join("training_log.csv")).unwrap();
        assert_eq!(log.lines().count(), 61);
    }

    #[test]
    fn test_same_seed_gives_same_metrics() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let ra = TrainUseCase::new(config(a.path())).execute().unwrap();
        let rb = TrainUseCase::new(config(b.path())).execute().unwrap();

        assert_eq!(ra.metrics, rb.metrics);
        assert_ne!(ra.pair_id, rb.pair_id);
    }

    #[test]
    fn test_invalid_fraction_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { test_fraction: 1.0, ..config(dir.path()) };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }

    #[test]
    fn test_missing_data_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            data_path:    dir.path().join("absent.csv").display().to_string(),
            artifact_dir: dir.path().join("model").display().to_string(),
            ..Default::default()
        };
        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(format!("{err:#}").contains("absent.csv"));
    }
}
