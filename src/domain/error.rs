// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure the pipeline core can produce falls into one of
// four kinds:
//
//   DataFormat     — training input is malformed or incomplete
//   SchemaMismatch — a row's shape disagrees with the Schema
//   Validation     — an inference request is malformed
//   ArtifactLoad   — persisted artifacts are missing or unpaired
//
// Recovery happens locally only for the zero-stddev guard,
// unseen categories, and missing TotalCharges at load time.
// Everything else surfaces as one of these variants.

use thiserror::Error;

/// Result alias used throughout the pipeline core.
pub type Result<T> = std::result::Result<T, ChurnError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChurnError {
    /// Malformed or incomplete training source.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// A row is missing a schema field, carries an undeclared one,
    /// or holds a value of the wrong shape.
    #[error("schema mismatch on field '{field}': {reason}")]
    SchemaMismatch { field: String, reason: String },

    /// A single inference request failed validation.
    #[error("invalid field '{field}': expected {expected}")]
    Validation { field: String, expected: String },

    /// Artifacts could not be loaded as a matching pair.
    #[error("cannot load artifacts from '{path}': {reason}")]
    ArtifactLoad { path: String, reason: String },
}

impl ChurnError {
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat(message.into())
    }

    pub fn schema_mismatch(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch { field: field.into(), reason: reason.into() }
    }

    pub fn validation(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), expected: expected.into() }
    }

    pub fn artifact_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArtifactLoad { path: path.into(), reason: reason.into() }
    }

    /// True for per-request client errors that must not stop the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let e = ChurnError::validation("tenure", "non-negative integer");
        assert_eq!(e.to_string(), "invalid field 'tenure': expected non-negative integer");
        assert!(e.is_client_error());
    }

    #[test]
    fn test_artifact_errors_are_not_client_errors() {
        let e = ChurnError::artifact_load("model", "pair id mismatch");
        assert!(!e.is_client_error());
    }
}
