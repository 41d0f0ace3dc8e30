// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams of the pipeline. The Trainer and the Inference
// Service are written against these traits only:
//
//   RecordSource     → anything that yields labelled/unlabelled rows
//   Classifier       → an unfitted learner: fit(X, y) -> Fitted
//   FittedClassifier → a fitted model: predict_proba(X) -> [P(churn)]
//   Persistable      → state that round-trips through a directory
//
// A gradient-boosted model or a lookup-table baseline would slot in
// by implementing Classifier + FittedClassifier; nothing upstream
// changes.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::Path;

use crate::domain::error::Result;
use crate::domain::record::{FeatureVector, RawRecord};

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// A batch of records as it leaves the Loader.
#[derive(Debug, Clone, Default)]
pub struct LoadedBatch {
    /// Identifier of each row, kept beside (never inside) the record
    pub ids:       Vec<Option<String>>,
    /// Records with the identifier dropped and TotalCharges numeric
    pub records:   Vec<RawRecord>,
    /// Churn labels, present when the source carried a label column
    pub labels:    Option<Vec<bool>>,
    /// Batch median used to fill missing TotalCharges values
    pub median:    f64,
    /// How many rows were filled with the median
    pub imputed:   usize,
}

impl LoadedBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Any component that can load customer records from a source.
pub trait RecordSource {
    fn load(&self) -> Result<LoadedBatch>;
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// An unfitted probabilistic binary classifier.
pub trait Classifier {
    type Fitted: FittedClassifier;

    /// Learn from feature vectors and their labels (true = churn).
    /// Every vector must share the Transformer's output width.
    fn fit(&self, features: &[FeatureVector], labels: &[bool]) -> Result<Self::Fitted>;
}

/// A fitted classifier. Read-only, shared across threads while serving.
pub trait FittedClassifier: Send + Sync {
    /// P(label = churn) for each vector, each in [0, 1].
    fn predict_proba(&self, features: &[FeatureVector]) -> Result<Vec<f64>>;

    /// Width of the feature vectors this model was fit on.
    fn n_features(&self) -> usize;

    /// Short algorithm name reported by the version surface.
    fn model_type(&self) -> &'static str;

    /// Loss per training epoch, for models trained iteratively.
    fn training_loss(&self) -> &[f64] {
        &[]
    }
}

// ─── Persistable ──────────────────────────────────────────────────────────────
/// State that can be saved into and restored from an artifact directory.
///
/// Every file written by `save` carries the pair id of the run, and
/// `load` hands it back so the caller can check it against the rest
/// of the pair.
pub trait Persistable: Sized {
    fn save(&self, dir: &Path, pair_id: &str) -> anyhow::Result<()>;

    /// The restored state and the pair id it was saved under.
    fn load(dir: &Path) -> Result<(Self, String)>;
}
