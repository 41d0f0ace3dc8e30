// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// pipeline works with. No burn types, no file I/O here.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Typed failures shared by every layer
pub mod error;

// Field names, kinds and column order
pub mod schema;

// Raw records, labels, feature vectors and predictions
pub mod record;

// Core abstractions (traits) that other layers implement
pub mod traits;
