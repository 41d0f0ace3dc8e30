// ============================================================
// Layer 3 — Record Domain Types
// ============================================================
// A RawRecord is one customer: field name → value.
// By the time a RawRecord exists the identifier column is gone
// and TotalCharges has been coerced to a number (or imputed).
//
// Values are either numbers or text. Categorical integer codes
// (SeniorCitizen) are stored as text ("0" / "1") so the
// Transformer sees every categorical value as a string.
//
// Reference: Rust Book §8 (Hash Maps), §6 (Enums)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fixed-length numeric representation of one record.
pub type FeatureVector = Vec<f64>;

/// One field value in a raw record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_)   => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s)   => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// A single customer record keyed by field name.
///
/// BTreeMap keeps iteration order deterministic, but column order
/// in the feature vector always comes from the Schema, never from here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures:
    ///   RawRecord::new().with("tenure", 12.0).with("Contract", "One year")
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}

/// The binary training label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Churn {
    Yes,
    No,
}

impl Churn {
    /// Parse the label column. Only the exact strings "Yes" / "No" are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Yes" => Some(Churn::Yes),
            "No"  => Some(Churn::No),
            _     => None,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Churn::Yes)
    }
}

/// The inference response body: `{"churn_probability": p}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub churn_probability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let r = RawRecord::new().with("tenure", 12.0).with("Contract", "One year");
        assert_eq!(r.len(), 2);
        assert_eq!(r.get("tenure").and_then(FieldValue::as_number), Some(12.0));
        assert_eq!(r.get("Contract").and_then(FieldValue::as_text), Some("One year"));
        assert!(r.get("gender").is_none());
    }

    #[test]
    fn test_churn_label_parsing_is_exact() {
        assert_eq!(Churn::parse("Yes"), Some(Churn::Yes));
        assert_eq!(Churn::parse("No"), Some(Churn::No));
        assert_eq!(Churn::parse("yes"), None);
        assert!(Churn::Yes.is_positive());
    }

    #[test]
    fn test_prediction_serialises_to_response_shape() {
        let p = Prediction { churn_probability: 0.25 };
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"churn_probability":0.25}"#);
    }
}
