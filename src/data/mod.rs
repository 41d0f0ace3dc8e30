// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw CSV file to model-ready feature
// vectors.
//
//   telco_churn.csv
//       │
//       ▼
//   CsvLoader     → drops customerID, coerces + imputes TotalCharges,
//       │           splits off the Churn label
//       ▼
//   Transformer   → fit: per-field mean/stddev and vocabularies
//       │           transform: scaled numerics + one-hot blocks
//       ▼
//   Splitter      → seeded train / holdout partition
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Loads labelled or unlabelled customer rows from CSV
pub mod loader;

/// Fits and applies the numeric + categorical feature transform
pub mod transformer;

/// Seeded shuffle and train/holdout split
pub mod splitter;

#[cfg(test)]
pub(crate) mod fixtures;
