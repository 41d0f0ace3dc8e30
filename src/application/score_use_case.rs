// ============================================================
// Layer 2 — ScoreUseCase
// ============================================================
// Batch-scores an unlabelled CSV with a saved artifact pair:
//
//   Step 1: Load the artifact pair       (Layer 6 - infra)
//   Step 2: Load the CSV (no Churn)      (Layer 4 - data)
//   Step 3: Transform + predict_proba    (Layers 4, 5)
//   Step 4: Write customerID,churn_probability rows
//
// Rows go through the same Loader rules as training, including
// median imputation of TotalCharges over the scored batch.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::application::predict_use_case::InferenceService;
use crate::data::loader::CsvLoader;
use crate::domain::schema::Schema;
use crate::domain::traits::RecordSource;
use crate::ml::inferencer::FittedLogistic;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    pub input_path:   String,
    pub output_path:  String,
    pub artifact_dir: String,
}

/// One row of the output file.
#[derive(Debug, Serialize)]
struct ScoredRow<'a> {
    #[serde(rename = "customerID")]
    customer_id:       &'a str,
    churn_probability: f64,
}

pub struct ScoreUseCase {
    config: ScoreConfig,
}

impl ScoreUseCase {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    /// Score every row and return how many were written.
    pub fn execute(&self) -> Result<usize> {
        let cfg = &self.config;

        let service = InferenceService::<FittedLogistic>::from_artifacts(Path::new(&cfg.artifact_dir))?;
        tracing::info!("Scoring with {}", service.model_identity());

        let batch = CsvLoader::unlabelled(&cfg.input_path, Schema::telco())
            .load()
            .with_context(|| format!("Failed to load '{}'", cfg.input_path))?;
        let probabilities = service.predict_batch(&batch.records)?;

        let mut wtr = csv::Writer::from_path(&cfg.output_path)
            .with_context(|| format!("Cannot create '{}'", cfg.output_path))?;
        for (row, (id, p)) in batch.ids.iter().zip(&probabilities).enumerate() {
            // Rows without an id column are numbered from 1
            let fallback = (row + 1).to_string();
            let customer_id = id.as_deref().unwrap_or(&fallback);
            wtr.serialize(ScoredRow { customer_id, churn_probability: *p })?;
        }
        wtr.flush()?;

        tracing::info!("Wrote {} scores to '{}'", probabilities.len(), cfg.output_path);
        Ok(probabilities.len())
    }
}
