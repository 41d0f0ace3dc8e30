// ============================================================
// Layer 5 — Logistic Regression Module (Burn)
// ============================================================
// A single linear layer over the transformed feature vector:
//
//   logit = b + Σ wᵢ xᵢ
//   P(churn) = sigmoid(logit)
//
// Weights start at zero so a fit is a deterministic function of
// the training data. The loss is binary cross-entropy on logits
// plus an L2 penalty on the weights (the bias is not penalised).
//
// Reference: Burn Book §3 (Building Blocks)

use anyhow::Result;
use burn::{
    module::Param,
    nn::{
        loss::BinaryCrossEntropyLossConfig,
        Initializer, Linear, LinearConfig,
    },
    prelude::*,
};

#[derive(Config, Debug)]
pub struct LogisticConfig {
    /// Width of the transformed feature vector
    pub n_features: usize,
}

impl LogisticConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LogisticModel<B> {
        let linear = LinearConfig::new(self.n_features, 1)
            .with_initializer(Initializer::Zeros)
            .init(device);
        LogisticModel { linear }
    }

    /// Rebuild a module from extracted parameters (used when saving).
    pub fn init_with<B: Backend>(&self, weights: &[f32], bias: f32, device: &B::Device) -> LogisticModel<B> {
        let mut model = self.init(device);
        let weight = Tensor::<B, 1>::from_floats(weights, device).reshape([weights.len(), 1]);
        model.linear.weight = Param::from_tensor(weight);
        model.linear.bias   = Some(Param::from_tensor(Tensor::<B, 1>::from_floats([bias], device)));
        model
    }
}

#[derive(Module, Debug)]
pub struct LogisticModel<B: Backend> {
    pub linear: Linear<B>,
}

impl<B: Backend> LogisticModel<B> {
    /// Logits for a batch: input [batch, n_features], output [batch].
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 1> {
        // [batch, 1] → [batch]
        self.linear.forward(features).flatten::<1>(0, 1)
    }

    /// Mean binary cross-entropy plus `l2 / 2 · ‖w‖²`.
    pub fn forward_loss(&self, features: Tensor<B, 2>, targets: Tensor<B, 1, Int>, l2: f64) -> Tensor<B, 1> {
        let logits = self.forward(features);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device())
            .forward(logits, targets);

        let w = self.linear.weight.val();
        let penalty = (w.clone() * w).sum().mul_scalar(0.5 * l2);
        bce + penalty
    }

    /// Copy the learned weights and bias out of the module.
    pub fn parameters(&self) -> Result<(Vec<f32>, f32)> {
        let weights = self
            .linear
            .weight
            .val()
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("cannot read weights: {e:?}"))?;

        let bias = match &self.linear.bias {
            Some(b) => b
                .val()
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| anyhow::anyhow!("cannot read bias: {e:?}"))?
                .first()
                .copied()
                .unwrap_or(0.0),
            None => 0.0,
        };

        Ok((weights, bias))
    }
}
