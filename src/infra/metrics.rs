// ============================================================
// Layer 6 — Metrics
// ============================================================
// Two records of a training run:
//
//   HoldoutMetrics — accuracy, precision, recall and F1 of the
//                    fitted classifier on the holdout partition,
//                    thresholded at P(churn) >= 0.5.
//                    Saved as metrics.json.
//
//   TrainingLog    — loss after every epoch, appended to
//                    training_log.csv for plotting.
//
// Example CSV output:
//   epoch,loss
//   1,0.693147
//   2,0.671204
//   ...
//
// Precision, recall and F1 are reported as 0.0 when their
// denominator is zero (no predicted or no actual positives).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Decision threshold used to turn probabilities into labels.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Classification quality on the holdout partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldoutMetrics {
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    /// Number of holdout rows the metrics were computed on
    pub support:   usize,
}

impl HoldoutMetrics {
    /// Compare predicted probabilities against true labels.
    pub fn compute(probabilities: &[f64], labels: &[bool]) -> Self {
        let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);

        for (p, &actual) in probabilities.iter().zip(labels) {
            let predicted = *p >= DECISION_THRESHOLD;
            match (predicted, actual) {
                (true, true)   => tp += 1,
                (true, false)  => fp += 1,
                (false, false) => tn += 1,
                (false, true)  => fn_ += 1,
            }
        }

        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

        let support   = tp + fp + tn + fn_;
        let precision = ratio(tp, tp + fp);
        let recall    = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        Self { accuracy: ratio(tp + tn, support), precision, recall, f1, support }
    }
}

impl std::fmt::Display for HoldoutMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MODEL METRICS ({} holdout rows):", self.support)?;
        writeln!(f, "  • Accuracy : {:.4}", self.accuracy)?;
        writeln!(f, "  • Precision: {:.4}", self.precision)?;
        writeln!(f, "  • Recall   : {:.4}", self.recall)?;
        write!(f, "  • F1 Score : {:.4}", self.f1)
    }
}

/// Writes the per-epoch loss curve to a CSV file.
pub struct TrainingLog {
    csv_path: PathBuf,
}

impl TrainingLog {
    /// Create the CSV (overwriting any previous run) with its header row.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("training_log.csv");

        let mut f = fs::File::create(&csv_path)?;
        writeln!(f, "epoch,loss")?;
        tracing::debug!("Created training log: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one row per epoch; epochs are numbered from 1.
    pub fn append(&self, losses: &[f64]) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        for (i, loss) in losses.iter().enumerate() {
            writeln!(f, "{},{:.6}", i + 1, loss)?;
        }
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
