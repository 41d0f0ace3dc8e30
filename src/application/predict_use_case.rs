// ============================================================
// Layer 2 — Inference Service
// ============================================================
// Scores one customer at a time against a loaded artifact pair.
//
// Per request:
//   1. validate  — the JSON object must carry exactly the schema
//                  fields, each with the right type
//   2. transform — single-record batch through the Transformer
//   3. score     — predict_proba, P(churn)
//
// The fitted Transformer and Classifier are injected at
// construction (or loaded once from an artifact directory) and
// are read-only afterwards. Both sit behind Arc, so clones of the
// service are cheap and any number of threads may call predict()
// at the same time without locking.
//
// Validation is the only place a request is checked. A bad
// request is a ValidationError naming the field and the expected
// type; the service itself stays up.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, path::Path, sync::Arc};

use crate::data::transformer::FittedTransformer;
use crate::domain::error::{ChurnError, Result};
use crate::domain::record::{FieldValue, Prediction, RawRecord};
use crate::domain::schema::{FieldKind, FieldSpec, Schema, ValueType};
use crate::domain::traits::{FittedClassifier, Persistable};
use crate::infra::checkpoint::ArtifactStore;

pub const MODEL_VERSION: &str = "1.0.0";
pub const DATASET_NAME:  &str = "Telco Customer Churn";

/// What to do when a request omits TotalCharges or sends it blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingValuePolicy {
    /// Answer with a ValidationError.
    #[default]
    Reject,
    /// Fill in the median recorded when the Transformer was fitted.
    ImputeTrainingMedian,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status:       String,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub model_version: String,
    pub model_type:    String,
    pub dataset:       String,
    pub feature_count: usize,
    pub pair_id:       String,
}

pub struct InferenceService<C> {
    schema:      Schema,
    transformer: Arc<FittedTransformer>,
    classifier:  Arc<C>,
    pair_id:     String,
    policy:      MissingValuePolicy,
}

impl<C> Clone for InferenceService<C> {
    fn clone(&self) -> Self {
        Self {
            schema:      self.schema.clone(),
            transformer: Arc::clone(&self.transformer),
            classifier:  Arc::clone(&self.classifier),
            pair_id:     self.pair_id.clone(),
            policy:      self.policy,
        }
    }
}

impl<C: FittedClassifier> fmt::Debug for InferenceService<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceService")
            .field("model_type", &self.classifier.model_type())
            .field("feature_len", &self.transformer.feature_len())
            .field("pair_id", &self.pair_id)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<C: FittedClassifier> InferenceService<C> {
    /// Build a service around an already-fitted pair.
    pub fn new(transformer: FittedTransformer, classifier: C, pair_id: impl Into<String>) -> Self {
        Self {
            schema:      Schema::telco(),
            transformer: Arc::new(transformer),
            classifier:  Arc::new(classifier),
            pair_id:     pair_id.into(),
            policy:      MissingValuePolicy::default(),
        }
    }

    /// Load the pair saved by a training run. Any problem with the
    /// artifacts is an ArtifactLoad error and no service is built.
    pub fn from_artifacts(dir: &Path) -> Result<Self>
    where
        C: Persistable,
    {
        let schema = Schema::telco();
        let pair = ArtifactStore::new(dir).load_pair::<C>(&schema)?;
        Ok(Self::new(pair.transformer, pair.classifier, pair.pair_id).with_schema(schema))
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MissingValuePolicy {
        self.policy
    }

    pub fn transformer(&self) -> &FittedTransformer {
        &self.transformer
    }

    // ─── Scoring ──────────────────────────────────────────────────────────────

    /// Validate, transform and score one JSON request.
    pub fn predict(&self, request: &Value) -> Result<Prediction> {
        let record = self.validate(request)?;

        tracing::info!(
            "Prediction request: tenure={}, MonthlyCharges={}, Contract={}",
            display_field(&record, "tenure"),
            display_field(&record, "MonthlyCharges"),
            display_field(&record, "Contract"),
        );

        let churn_probability = self.predict_record(&record)?;
        tracing::info!("Prediction output: {:.4}", churn_probability);

        Ok(Prediction { churn_probability })
    }

    /// Score a record that has already been validated.
    pub fn predict_record(&self, record: &RawRecord) -> Result<f64> {
        let features = self.transformer.transform(record)?;
        match self.classifier.predict_proba(&[features])?.as_slice() {
            [p] => Ok(*p),
            other => Err(ChurnError::schema_mismatch(
                "churn_probability",
                format!(
                    "{} returned {} probabilities for one record",
                    self.classifier.model_type(),
                    other.len()
                ),
            )),
        }
    }

    /// Score many records in one call.
    pub fn predict_batch(&self, records: &[RawRecord]) -> Result<Vec<f64>> {
        let features = self.transformer.transform_batch(records)?;
        self.classifier.predict_proba(&features)
    }

    // ─── Validation ───────────────────────────────────────────────────────────

    /// Turn a JSON request into a RawRecord, checking the field set and types.
    pub fn validate(&self, request: &Value) -> Result<RawRecord> {
        let object = request
            .as_object()
            .ok_or_else(|| ChurnError::validation("request", "a JSON object"))?;

        if let Some(extra) = object.keys().find(|k| !self.schema.contains(k.as_str())) {
            return Err(ChurnError::validation(extra.as_str(), "no such field in the schema"));
        }

        let mut record = RawRecord::new();
        for spec in self.schema.fields() {
            let imputable = self.schema.imputed_field() == Some(spec.name.as_str());
            let value = match object.get(&spec.name) {
                Some(v) if imputable && is_blank(v) => self.missing_value(spec, imputable)?,
                Some(v) => self.typed_value(spec, v)?,
                None => self.missing_value(spec, imputable)?,
            };
            record.insert(spec.name.clone(), value);
        }
        Ok(record)
    }

    fn typed_value(&self, spec: &FieldSpec, value: &Value) -> Result<FieldValue> {
        let invalid = || ChurnError::validation(spec.name.as_str(), spec.value_type.describe());

        match (spec.kind, spec.value_type) {
            (FieldKind::Numeric, ValueType::Integer) => {
                whole_number(value).map(FieldValue::Number).ok_or_else(invalid)
            }
            (FieldKind::Numeric, _) => value
                .as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(FieldValue::Number)
                .ok_or_else(invalid),
            (FieldKind::Categorical, ValueType::Integer) => whole_number(value)
                .map(|n| FieldValue::Text(format!("{}", n as u64)))
                .ok_or_else(invalid),
            (FieldKind::Categorical, _) => value
                .as_str()
                .map(|s| FieldValue::Text(s.to_string()))
                .ok_or_else(invalid),
        }
    }

    /// Absent value for `spec`, or a null / blank one for the imputed field.
    fn missing_value(&self, spec: &FieldSpec, imputable: bool) -> Result<FieldValue> {
        match (self.policy, self.transformer.imputation()) {
            (MissingValuePolicy::ImputeTrainingMedian, Some(imp)) if imputable => {
                tracing::debug!("Imputing '{}' with training median {:.4}", spec.name, imp.median);
                Ok(FieldValue::Number(imp.median))
            }
            _ => Err(ChurnError::validation(spec.name.as_str(), spec.value_type.describe())),
        }
    }

    // ─── Health / version ─────────────────────────────────────────────────────

    /// True once a pair is held. A service only exists with a loaded pair.
    pub fn is_loaded(&self) -> bool {
        self.classifier.n_features() == self.transformer.feature_len()
    }

    pub fn health(&self) -> HealthReport {
        HealthReport { status: "ok".to_string(), model_loaded: self.is_loaded() }
    }

    pub fn version(&self) -> VersionInfo {
        VersionInfo {
            model_version: MODEL_VERSION.to_string(),
            model_type:    self.classifier.model_type().to_string(),
            dataset:       DATASET_NAME.to_string(),
            feature_count: self.transformer.feature_len(),
            pair_id:       self.pair_id.clone(),
        }
    }

    /// e.g. "LogisticRegression 1.0.0 (pair 3f9a0c1d2b4e5f60)"
    pub fn model_identity(&self) -> String {
        format!("{} {} (pair {})", self.classifier.model_type(), MODEL_VERSION, self.pair_id)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// A non-negative integral JSON number (12 or 12.0).
fn whole_number(value: &Value) -> Option<f64> {
    if let Some(n) = value.as_u64() {
        return Some(n as f64);
    }
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
}

fn display_field(record: &RawRecord, name: &str) -> String {
    match record.get(name) {
        Some(FieldValue::Number(n)) => n.to_string(),
        Some(FieldValue::Text(s)) => s.clone(),
        None => "-".to_string(),
    }
}
