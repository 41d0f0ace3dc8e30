// ============================================================
// Layer 5 — Logistic Regression Training Loop
// ============================================================
// Full-batch gradient descent with Burn's Adam optimiser.
//
// Every epoch sees the whole training partition at once:
//   1. forward pass → logits [n]
//   2. BCE-with-logits + L2 penalty
//   3. backward pass → gradients
//   4. Adam step
//
// Key Burn insight:
//   - Training runs on TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() strips autodiff before parameters are read out
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::domain::error::{ChurnError, Result};
use crate::domain::record::FeatureVector;
use crate::domain::traits::Classifier;
use crate::ml::inferencer::FittedLogistic;
use crate::ml::model::{LogisticConfig, LogisticModel};

type TrainBackend = Autodiff<NdArray>;

/// Unfitted logistic regression with its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub epochs:        usize,
    pub learning_rate: f64,
    pub l2_penalty:    f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self { epochs: 200, learning_rate: 0.05, l2_penalty: 1e-4 }
    }
}

impl Classifier for LogisticRegression {
    type Fitted = FittedLogistic;

    fn fit(&self, features: &[FeatureVector], labels: &[bool]) -> Result<FittedLogistic> {
        let n_features = check_training_shape(features, labels)?;
        if self.epochs == 0 {
            return Err(ChurnError::data_format("epochs must be at least 1"));
        }

        let device = NdArrayDevice::default();
        let n      = features.len();

        // ── Tensors ───────────────────────────────────────────────────────────
        // Flatten row-major, then reshape to [n, n_features]
        let flat: Vec<f32> = features
            .iter()
            .flat_map(|v| v.iter().map(|&x| x as f32))
            .collect();
        let x = Tensor::<TrainBackend, 1>::from_floats(flat.as_slice(), &device)
            .reshape([n, n_features]);

        let targets: Vec<i32> = labels.iter().map(|&y| i32::from(y)).collect();
        let y = Tensor::<TrainBackend, 1, Int>::from_ints(targets.as_slice(), &device);

        // ── Model + optimiser ─────────────────────────────────────────────────
        let config = LogisticConfig::new(n_features);
        let mut model: LogisticModel<TrainBackend> = config.init(&device);
        let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

        tracing::info!(
            "Fitting logistic regression: {} rows × {} features, {} epochs, lr={}",
            n, n_features, self.epochs, self.learning_rate
        );

        let mut history = Vec::with_capacity(self.epochs);
        for epoch in 1..=self.epochs {
            let loss = model.forward_loss(x.clone(), y.clone(), self.l2_penalty);
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            history.push(loss_val);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(self.learning_rate, model, grads);

            if epoch == 1 || epoch % 50 == 0 || epoch == self.epochs {
                tracing::debug!("Epoch {:>4}/{} | loss={:.6}", epoch, self.epochs, loss_val);
            }
        }

        let (weights, bias) = model
            .valid()
            .parameters()
            .map_err(|e| ChurnError::data_format(e.to_string()))?;

        if let Some(last) = history.last() {
            tracing::info!("Training finished: final loss={:.6}", last);
        }

        Ok(FittedLogistic::new(config, weights, bias).with_training_loss(history))
    }
}

/// Check labels line up with rows and every row shares one width.
fn check_training_shape(features: &[FeatureVector], labels: &[bool]) -> Result<usize> {
    let first = features
        .first()
        .ok_or_else(|| ChurnError::data_format("cannot fit a classifier on zero rows"))?;

    if features.len() != labels.len() {
        return Err(ChurnError::data_format(format!(
            "{} feature rows but {} labels",
            features.len(),
            labels.len()
        )));
    }

    let width = first.len();
    if width == 0 {
        return Err(ChurnError::schema_mismatch("features", "feature vectors are empty"));
    }
    if let Some(bad) = features.iter().position(|v| v.len() != width) {
        return Err(ChurnError::schema_mismatch(
            "features",
            format!("row {bad} has width {} but row 0 has {width}", features[bad].len()),
        ));
    }
    Ok(width)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::training_records;
    use crate::data::transformer::Transformer;
    use crate::domain::schema::Schema;
    use crate::domain::traits::FittedClassifier;

    #[test]
    fn test_fit_learns_separable_pattern() {
        let (rows, labels) = training_records();
        let t = Transformer::new(Schema::telco()).fit(&rows).unwrap();
        let x = t.transform_batch(&rows).unwrap();

        let model = LogisticRegression::default().fit(&x, &labels).unwrap();
        let history = model.training_loss();
        assert_eq!(model.n_features(), t.feature_len());
        assert_eq!(history.len(), 200);
        assert!(history[199] < history[0]);

        let probs = model.predict_proba(&x).unwrap();
        let correct = probs
            .iter()
            .zip(&labels)
            .filter(|(p, y)| (**p >= 0.5) == **y)
            .count();
        assert!(correct as f64 / labels.len() as f64 > 0.75);
    }

    #[test]
    fn test_label_count_mismatch_rejected() {
        let x = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let err = LogisticRegression::default().fit(&x, &[true]).unwrap_err();
        assert!(matches!(err, ChurnError::DataFormat(_)));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let x = vec![vec![1.0, 0.0], vec![0.0]];
        let err = LogisticRegression::default().fit(&x, &[true, false]).unwrap_err();
        assert!(matches!(err, ChurnError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_empty_fit_rejected() {
        assert!(LogisticRegression::default().fit(&[], &[]).is_err());
    }
}
