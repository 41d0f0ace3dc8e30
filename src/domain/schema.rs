// ============================================================
// Layer 3 — Schema
// ============================================================
// The canonical list of model input fields.
//
// Two ordered lists partition the inputs:
//   numeric     → centred and scaled by the Transformer
//   categorical → expanded into one indicator per known category
//
// The order of both lists is the order of feature-vector columns,
// so it must never change between training and serving.
//
// Example (the telco schema):
//   numeric:     tenure, MonthlyCharges, TotalCharges
//   categorical: gender, SeniorCitizen, Partner, ... PaymentMethod

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::error::{ChurnError, Result};

/// Identifier column. Present in source files, dropped before any transform.
pub const ID_FIELD: &str = "customerID";

/// Label column, present in training data only.
pub const LABEL_FIELD: &str = "Churn";

/// Field that may arrive as a blank placeholder and gets imputed at load time.
pub const IMPUTED_FIELD: &str = "TotalCharges";

const TELCO_NUMERIC: [(&str, ValueType); 3] = [
    ("tenure", ValueType::Integer),
    ("MonthlyCharges", ValueType::Decimal),
    ("TotalCharges", ValueType::Decimal),
];

const TELCO_CATEGORICAL: [(&str, ValueType); 16] = [
    ("gender", ValueType::Text),
    ("SeniorCitizen", ValueType::Integer),
    ("Partner", ValueType::Text),
    ("Dependents", ValueType::Text),
    ("PhoneService", ValueType::Text),
    ("MultipleLines", ValueType::Text),
    ("InternetService", ValueType::Text),
    ("OnlineSecurity", ValueType::Text),
    ("OnlineBackup", ValueType::Text),
    ("DeviceProtection", ValueType::Text),
    ("TechSupport", ValueType::Text),
    ("StreamingTV", ValueType::Text),
    ("StreamingMovies", ValueType::Text),
    ("Contract", ValueType::Text),
    ("PaperlessBilling", ValueType::Text),
    ("PaymentMethod", ValueType::Text),
];

/// How a field is encoded into the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Numeric,
    Categorical,
}

/// The wire type a field's value must have in an inference request.
///
/// `SeniorCitizen` is categorical but arrives as an integer code,
/// so kind and value type are tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// Non-negative whole number
    Integer,
    /// Non-negative finite real number
    Decimal,
    /// Free string drawn from a field-specific vocabulary
    Text,
}

impl ValueType {
    /// Human-readable description used in validation errors.
    pub fn describe(self) -> &'static str {
        match self {
            ValueType::Integer => "non-negative integer",
            ValueType::Decimal => "non-negative number",
            ValueType::Text    => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name:       String,
    pub kind:       FieldKind,
    pub value_type: ValueType,
}

/// Immutable, ordered description of the model inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    numeric:       Vec<FieldSpec>,
    categorical:   Vec<FieldSpec>,
    imputed_field: Option<String>,
}

impl Schema {
    /// Build a schema, rejecting duplicate names across or within the lists.
    pub fn new(
        numeric:       Vec<(String, ValueType)>,
        categorical:   Vec<(String, ValueType)>,
        imputed_field: Option<String>,
    ) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for (name, _) in numeric.iter().chain(categorical.iter()) {
            if !seen.insert(name.clone()) {
                return Err(ChurnError::schema_mismatch(name, "declared more than once"));
            }
        }

        if let Some(f) = &imputed_field {
            if !numeric.iter().any(|(n, _)| n == f) {
                return Err(ChurnError::schema_mismatch(f, "imputed field must be numeric"));
            }
        }

        let to_spec = |kind: FieldKind| {
            move |(name, value_type): (String, ValueType)| FieldSpec { name, kind, value_type }
        };

        Ok(Self {
            numeric:     numeric.into_iter().map(to_spec(FieldKind::Numeric)).collect(),
            categorical: categorical.into_iter().map(to_spec(FieldKind::Categorical)).collect(),
            imputed_field,
        })
    }

    /// The 19-field telco customer schema.
    pub fn telco() -> Self {
        let spec = |kind: FieldKind| {
            move |&(name, value_type): &(&str, ValueType)| FieldSpec {
                name: name.to_string(),
                kind,
                value_type,
            }
        };
        Self {
            numeric:       TELCO_NUMERIC.iter().map(spec(FieldKind::Numeric)).collect(),
            categorical:   TELCO_CATEGORICAL.iter().map(spec(FieldKind::Categorical)).collect(),
            imputed_field: Some(IMPUTED_FIELD.to_string()),
        }
    }

    pub fn numeric_fields(&self) -> &[FieldSpec] {
        &self.numeric
    }

    pub fn categorical_fields(&self) -> &[FieldSpec] {
        &self.categorical
    }

    /// All input fields: numeric first, then categorical.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.numeric.iter().chain(self.categorical.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn imputed_field(&self) -> Option<&str> {
        self.imputed_field.as_deref()
    }

    /// Number of model input fields.
    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::telco()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telco_schema_partitions_nineteen_fields() {
        let s = Schema::telco();
        assert_eq!(s.numeric_fields().len(), 3);
        assert_eq!(s.categorical_fields().len(), 16);
        assert_eq!(s.len(), 19);

        let names: BTreeSet<_> = s.fields().map(|f| f.name.clone()).collect();
        assert_eq!(names.len(), 19);
        assert!(!names.contains(ID_FIELD));
        assert!(!names.contains(LABEL_FIELD));
    }

    #[test]
    fn test_numeric_order_is_stable() {
        let s = Schema::telco();
        let order: Vec<_> = s.numeric_fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(order, vec!["tenure", "MonthlyCharges", "TotalCharges"]);
        assert_eq!(s.categorical_fields()[0].name, "gender");
        assert_eq!(s.categorical_fields()[15].name, "PaymentMethod");
    }

    #[test]
    fn test_senior_citizen_is_categorical_integer() {
        let s = Schema::telco();
        let f = s.field("SeniorCitizen").unwrap();
        assert_eq!(f.kind, FieldKind::Categorical);
        assert_eq!(f.value_type, ValueType::Integer);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::new(
            vec![("a".into(), ValueType::Decimal)],
            vec![("a".into(), ValueType::Text)],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ChurnError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_imputed_field_must_be_numeric() {
        let err = Schema::new(
            vec![("a".into(), ValueType::Decimal)],
            vec![("b".into(), ValueType::Text)],
            Some("b".into()),
        );
        assert!(err.is_err());
    }
}
