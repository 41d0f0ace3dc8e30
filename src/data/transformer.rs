// ============================================================
// Layer 4 — Column Transformer
// ============================================================
// Maps a raw record to a fixed-length feature vector.
//
//   numeric fields     → (value - mean) / stddev
//   categorical fields → one indicator column per category seen
//                        at fit time (one-hot expansion)
//
// Column layout, for the telco schema:
//
//   [tenure, MonthlyCharges, TotalCharges,
//    gender=Female, gender=Male,
//    SeniorCitizen=0, SeniorCitizen=1,
//    ...
//    PaymentMethod=Bank transfer (automatic), ...]
//
// Numeric columns come first in schema order, then each categorical
// field's block in schema order. Categories inside a block are sorted,
// so the layout does not depend on the order rows were fitted in.
//
// Edge cases handled here and nowhere else:
//   - stddev of 0  → the column is 0 for every row
//   - unseen value → CategoryMatch::Unknown → all-zero block
//
// Once fitted, the statistics never change. `transform` is a pure
// function of (fitted state, record).
//
// Reference: Rust Book §13 (Iterators and Closures)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::data::loader::median;
use crate::domain::error::{ChurnError, Result};
use crate::domain::record::{FeatureVector, FieldValue, RawRecord};
use crate::domain::schema::Schema;

/// Standard deviations at or below this fraction of the mean's
/// magnitude are treated as exactly zero.
const DEGENERATE_SCALE: f64 = 1e-12;

/// Outcome of looking a categorical value up in a fitted vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryMatch {
    /// Index of the category inside the field's block
    Known(usize),
    /// Value absent from the training vocabulary
    Unknown,
}

/// Centre and scale learned for one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub field:   String,
    pub mean:    f64,
    pub std_dev: f64,
}

impl NumericStats {
    fn fit(field: &str, mut values: Vec<f64>) -> Self {
        // Summing in sorted order keeps the statistic independent of row order
        values.sort_by(|a, b| a.total_cmp(b));
        let n    = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let mut sq_dev: Vec<f64> = values.iter().map(|v| (v - mean).powi(2)).collect();
        sq_dev.sort_by(|a, b| a.total_cmp(b));
        let mut std_dev = (sq_dev.iter().sum::<f64>() / n).sqrt();

        if std_dev <= DEGENERATE_SCALE * mean.abs().max(1.0) {
            std_dev = 0.0;
        }
        Self { field: field.to_string(), mean, std_dev }
    }

    pub fn scale(&self, value: f64) -> f64 {
        if self.std_dev == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std_dev
        }
    }
}

/// Categories observed for one categorical field, sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub field:      String,
    pub categories: Vec<String>,
}

impl CategoryVocabulary {
    pub fn lookup(&self, value: &str) -> CategoryMatch {
        match self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(idx) => CategoryMatch::Known(idx),
            Err(_)  => CategoryMatch::Unknown,
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// The training-batch median of the imputed field, kept for provenance
/// and for the optional inference-time imputation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputation {
    pub field:  String,
    pub median: f64,
}

// ─── Transformer (unfitted) ───────────────────────────────────────────────────
/// Knows the schema; `fit` learns the statistics.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    schema: Schema,
}

impl Transformer {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    /// Learn per-field statistics from `rows`.
    pub fn fit(&self, rows: &[RawRecord]) -> Result<FittedTransformer> {
        if rows.is_empty() {
            return Err(ChurnError::data_format("cannot fit the transformer on an empty batch"));
        }

        for row in rows {
            reject_undeclared(row, |name| self.schema.contains(name))?;
        }

        let mut numeric = Vec::with_capacity(self.schema.numeric_fields().len());
        for spec in self.schema.numeric_fields() {
            let values = rows
                .iter()
                .map(|r| numeric_value(r, &spec.name))
                .collect::<Result<Vec<f64>>>()?;
            numeric.push(NumericStats::fit(&spec.name, values));
        }

        let mut categorical = Vec::with_capacity(self.schema.categorical_fields().len());
        for spec in self.schema.categorical_fields() {
            let mut seen = BTreeSet::new();
            for r in rows {
                seen.insert(text_value(r, &spec.name)?.to_string());
            }
            categorical.push(CategoryVocabulary {
                field:      spec.name.clone(),
                categories: seen.into_iter().collect(),
            });
        }

        let imputation = match self.schema.imputed_field() {
            Some(field) => {
                let mut values = rows
                    .iter()
                    .map(|r| numeric_value(r, field))
                    .collect::<Result<Vec<f64>>>()?;
                median(&mut values).map(|median| Imputation { field: field.to_string(), median })
            }
            None => None,
        };

        let fitted = FittedTransformer { numeric, categorical, imputation };
        tracing::info!(
            "Transformer fitted on {} rows: {} numeric + {} indicator columns",
            rows.len(),
            fitted.numeric.len(),
            fitted.feature_len() - fitted.numeric.len(),
        );
        for stats in &fitted.numeric {
            tracing::debug!("  {}: mean={:.4} std={:.4}", stats.field, stats.mean, stats.std_dev);
        }
        Ok(fitted)
    }
}

// ─── FittedTransformer ────────────────────────────────────────────────────────
/// Immutable fitted state. Serialised as part of the artifact pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransformer {
    numeric:     Vec<NumericStats>,
    categorical: Vec<CategoryVocabulary>,
    imputation:  Option<Imputation>,
}

impl FittedTransformer {
    pub fn numeric_stats(&self) -> &[NumericStats] {
        &self.numeric
    }

    pub fn vocabularies(&self) -> &[CategoryVocabulary] {
        &self.categorical
    }

    pub fn imputation(&self) -> Option<&Imputation> {
        self.imputation.as_ref()
    }

    pub fn stats(&self, field: &str) -> Option<&NumericStats> {
        self.numeric.iter().find(|s| s.field == field)
    }

    pub fn vocabulary(&self, field: &str) -> Option<&CategoryVocabulary> {
        self.categorical.iter().find(|v| v.field == field)
    }

    /// |numeric fields| + Σ |vocabulary of each categorical field|
    pub fn feature_len(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(CategoryVocabulary::len).sum::<usize>()
    }

    /// Column names in output order, e.g. `tenure`, `Contract=One year`.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|s| s.field.clone()).collect();
        for vocab in &self.categorical {
            names.extend(vocab.categories.iter().map(|c| format!("{}={}", vocab.field, c)));
        }
        names
    }

    /// True when this state was fitted over exactly the fields of `schema`,
    /// in the same order.
    pub fn matches_schema(&self, schema: &Schema) -> bool {
        let numeric = self.numeric.iter().map(|s| s.field.as_str());
        let categorical = self.categorical.iter().map(|v| v.field.as_str());
        numeric.eq(schema.numeric_fields().iter().map(|f| f.name.as_str()))
            && categorical.eq(schema.categorical_fields().iter().map(|f| f.name.as_str()))
    }

    fn declares(&self, name: &str) -> bool {
        self.stats(name).is_some() || self.vocabulary(name).is_some()
    }

    /// Transform one record into its feature vector.
    pub fn transform(&self, record: &RawRecord) -> Result<FeatureVector> {
        reject_undeclared(record, |name| self.declares(name))?;

        let mut out = Vec::with_capacity(self.feature_len());

        for stats in &self.numeric {
            let value = numeric_value(record, &stats.field)?;
            out.push(stats.scale(value));
        }

        for vocab in &self.categorical {
            let value = text_value(record, &vocab.field)?;
            let start = out.len();
            out.resize(start + vocab.len(), 0.0);
            match vocab.lookup(value) {
                CategoryMatch::Known(idx) => out[start + idx] = 1.0,
                CategoryMatch::Unknown => {
                    tracing::debug!("Unseen category '{}' for field '{}'", value, vocab.field);
                }
            }
        }

        Ok(out)
    }

    /// Transform a batch; fails on the first row that does not fit the schema.
    pub fn transform_batch(&self, rows: &[RawRecord]) -> Result<Vec<FeatureVector>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

fn reject_undeclared(record: &RawRecord, declared: impl Fn(&str) -> bool) -> Result<()> {
    match record.field_names().find(|name| !declared(name)) {
        Some(name) => Err(ChurnError::schema_mismatch(name, "field is not declared in the schema")),
        None => Ok(()),
    }
}

fn numeric_value(record: &RawRecord, field: &str) -> Result<f64> {
    match record.get(field) {
        Some(FieldValue::Number(v)) if v.is_finite() => Ok(*v),
        Some(FieldValue::Number(_)) => Err(ChurnError::schema_mismatch(field, "expected a finite number")),
        Some(FieldValue::Text(_))   => Err(ChurnError::schema_mismatch(field, "expected a number, found text")),
        None                        => Err(ChurnError::schema_mismatch(field, "field is missing")),
    }
}

fn text_value<'a>(record: &'a RawRecord, field: &str) -> Result<&'a str> {
    match record.get(field) {
        Some(FieldValue::Text(s))   => Ok(s),
        Some(FieldValue::Number(_)) => Err(ChurnError::schema_mismatch(field, "expected text, found a number")),
        None                        => Err(ChurnError::schema_mismatch(field, "field is missing")),
    }
}
