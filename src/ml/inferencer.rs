// ============================================================
// Layer 5 — Fitted Logistic Regression (Inference)
// ============================================================
// After training, the weights are copied out of the Burn module
// into plain vectors. Scoring is then a dot product and a sigmoid:
// no device, no tensors, nothing mutable, so one instance can be
// shared by every request thread.

use crate::domain::error::{ChurnError, Result};
use crate::domain::record::FeatureVector;
use crate::domain::traits::FittedClassifier;
use crate::ml::model::LogisticConfig;

pub const MODEL_TYPE: &str = "LogisticRegression";

#[derive(Debug, Clone)]
pub struct FittedLogistic {
    config:  LogisticConfig,
    weights: Vec<f32>,
    bias:    f32,
    // Per-epoch loss from the fit; empty for a model loaded from disk
    loss:    Vec<f64>,
}

impl FittedLogistic {
    pub fn new(config: LogisticConfig, weights: Vec<f32>, bias: f32) -> Self {
        Self { config, weights, bias, loss: Vec::new() }
    }

    pub fn with_training_loss(mut self, loss: Vec<f64>) -> Self {
        self.loss = loss;
        self
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// P(churn) for a single vector.
    fn score(&self, x: &[f64]) -> f64 {
        let logit = self
            .weights
            .iter()
            .zip(x)
            .fold(f64::from(self.bias), |acc, (w, xi)| acc + f64::from(*w) * xi);
        sigmoid(logit)
    }
}

impl FittedClassifier for FittedLogistic {
    fn predict_proba(&self, features: &[FeatureVector]) -> Result<Vec<f64>> {
        features
            .iter()
            .enumerate()
            .map(|(row, x)| {
                if x.len() != self.weights.len() {
                    return Err(ChurnError::schema_mismatch(
                        "features",
                        format!("row {row} has width {}, model expects {}", x.len(), self.weights.len()),
                    ));
                }
                Ok(self.score(x))
            })
            .collect()
    }

    fn n_features(&self) -> usize {
        self.config.n_features
    }

    fn model_type(&self) -> &'static str {
        MODEL_TYPE
    }

    fn training_loss(&self) -> &[f64] {
        &self.loss
    }
}

/// Numerically stable logistic function, clamped to [0, 1].
pub fn sigmoid(z: f64) -> f64 {
    let p = if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    };
    if p.is_nan() { 0.5 } else { p.clamp(0.0, 1.0) }
}
