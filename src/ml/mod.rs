// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The one concrete classifier shipped with the pipeline.
// Only this layer and the checkpoint store import burn.
//
//   model.rs      — Logistic regression as a Burn module
//                   (one Linear layer, BCE-with-logits loss)
//
//   trainer.rs    — LogisticRegression: implements Classifier,
//                   full-batch Adam training loop
//
//   inferencer.rs — FittedLogistic: implements FittedClassifier,
//                   plain-Rust scoring from extracted weights
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Logistic regression module and config
pub mod model;

/// Training loop behind the Classifier trait
pub mod trainer;

/// Fitted model used at serving time
pub mod inferencer;
