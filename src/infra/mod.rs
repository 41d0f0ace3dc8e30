// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Concerns shared by the use cases but owned by none of them:
//
//   checkpoint.rs — Artifact pair saving and loading
//                   The fitted Transformer and Classifier are
//                   always written together under one pair id,
//                   and loading checks they still belong
//                   together. Also saves/loads the TrainConfig
//                   and holdout metrics as JSON.
//
//   metrics.rs    — Holdout metrics and training log
//                   Accuracy / precision / recall / F1 on the
//                   holdout partition, and a per-epoch loss CSV
//                   for plotting.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Artifact pair saving and loading
pub mod checkpoint;

/// Holdout metrics and training loss CSV
pub mod metrics;
