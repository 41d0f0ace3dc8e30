// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - File access only through Layers 4 and 6
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Load → transform → split → fit → evaluate → persist
pub mod train_use_case;

// The Inference Service: validate and score single requests
pub mod predict_use_case;

// Batch scoring of an unlabelled CSV
pub mod score_use_case;
