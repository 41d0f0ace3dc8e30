// ============================================================
// Layer 4 — CSV Record Loader
// ============================================================
// Loads customer rows from a delimited file with a header row
// using the csv crate.
//
// Per row:
//   1. customerID is set aside (never part of the record)
//   2. numeric fields are parsed; tenure / MonthlyCharges must be
//      valid non-negative numbers or the load fails
//   3. TotalCharges is coerced: anything unparseable, including
//      blank or whitespace-only strings, counts as missing
//   4. categorical fields are kept verbatim as text
//   5. the Churn label ("Yes" / "No") is split off when required
//
// After all rows are read, missing TotalCharges values are filled
// with the median of the parseable values in the same batch.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::{fs::File, io::{BufReader, Read}, path::PathBuf};

use crate::domain::error::{ChurnError, Result};
use crate::domain::record::{Churn, FieldValue, RawRecord};
use crate::domain::schema::{FieldKind, Schema, ValueType, ID_FIELD, LABEL_FIELD};
use crate::domain::traits::{LoadedBatch, RecordSource};

/// Loads customer records from a CSV file.
/// Implements the RecordSource trait from Layer 3.
pub struct CsvLoader {
    path:          PathBuf,
    schema:        Schema,
    require_label: bool,
}

impl CsvLoader {
    /// A loader for labelled training data.
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self { path: path.into(), schema, require_label: true }
    }

    /// A loader for unlabelled scoring data (no Churn column needed).
    pub fn unlabelled(path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self { path: path.into(), schema, require_label: false }
    }
}

impl RecordSource for CsvLoader {
    fn load(&self) -> Result<LoadedBatch> {
        let file = File::open(&self.path).map_err(|e| {
            ChurnError::data_format(format!("cannot open '{}': {e}", self.path.display()))
        })?;

        let batch = load_from_reader(BufReader::new(file), &self.schema, self.require_label)?;

        tracing::info!(
            "Loaded {} rows from '{}' ({} TotalCharges values imputed with median {:.2})",
            batch.len(),
            self.path.display(),
            batch.imputed,
            batch.median,
        );
        Ok(batch)
    }
}

/// Column positions resolved once from the header row.
struct Columns {
    fields: Vec<(usize, FieldKind, ValueType, String)>,
    id:     Option<usize>,
    label:  Option<usize>,
}

fn resolve_columns(headers: &csv::StringRecord, schema: &Schema, require_label: bool) -> Result<Columns> {
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let mut fields = Vec::with_capacity(schema.len());
    for spec in schema.fields() {
        let idx = position(&spec.name).ok_or_else(|| {
            ChurnError::data_format(format!("missing required column '{}'", spec.name))
        })?;
        fields.push((idx, spec.kind, spec.value_type, spec.name.clone()));
    }

    let label = position(LABEL_FIELD);
    if require_label && label.is_none() {
        return Err(ChurnError::data_format(format!("missing required column '{LABEL_FIELD}'")));
    }

    for h in headers.iter() {
        let h = h.trim();
        if h != ID_FIELD && h != LABEL_FIELD && !schema.contains(h) {
            tracing::debug!("Ignoring column '{}' not declared in the schema", h);
        }
    }

    Ok(Columns {
        fields,
        id: position(ID_FIELD),
        label: if require_label { label } else { None },
    })
}

/// Read every row from `reader`, then impute missing TotalCharges.
pub fn load_from_reader<R: Read>(reader: R, schema: &Schema, require_label: bool) -> Result<LoadedBatch> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| ChurnError::data_format(format!("cannot read header row: {e}")))?
        .clone();
    let cols = resolve_columns(&headers, schema, require_label)?;
    let imputed_field = schema.imputed_field();

    let mut ids     = Vec::new();
    let mut records = Vec::new();
    let mut labels  = Vec::new();
    // Rows whose imputed field failed to parse, filled in after the pass
    let mut missing_rows = Vec::new();
    let mut present      = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        // Header is line 1, so data row 0 sits on line 2
        let line = row + 2;
        let raw = result.map_err(|e| ChurnError::data_format(format!("line {line}: {e}")))?;
        let cell = |idx: usize| raw.get(idx).unwrap_or("");

        let mut record = RawRecord::new();
        for (idx, kind, value_type, name) in &cols.fields {
            let text = cell(*idx);
            match kind {
                FieldKind::Categorical => {
                    record.insert(name.clone(), text);
                }
                FieldKind::Numeric if Some(name.as_str()) == imputed_field => {
                    match coerce_numeric(text) {
                        Some(v) if v < 0.0 => {
                            return Err(ChurnError::data_format(format!(
                                "line {line}: '{name}' must be non-negative, got {v}"
                            )));
                        }
                        Some(v) => {
                            present.push(v);
                            record.insert(name.clone(), v);
                        }
                        None => missing_rows.push((records.len(), name.clone())),
                    }
                }
                FieldKind::Numeric => {
                    let v = parse_required(text, *value_type).ok_or_else(|| {
                        ChurnError::data_format(format!(
                            "line {line}: '{name}' must be a {}, got '{text}'",
                            value_type.describe()
                        ))
                    })?;
                    record.insert(name.clone(), v);
                }
            }
        }

        if let Some(idx) = cols.label {
            let churn = Churn::parse(cell(idx).trim()).ok_or_else(|| {
                ChurnError::data_format(format!(
                    "line {line}: '{LABEL_FIELD}' must be Yes or No, got '{}'",
                    cell(idx)
                ))
            })?;
            labels.push(churn.is_positive());
        }

        ids.push(cols.id.map(|idx| cell(idx).to_string()));
        records.push(record);
    }

    if records.is_empty() {
        return Err(ChurnError::data_format("source contains no data rows"));
    }

    let mut median_value = 0.0;
    if let Some(field) = imputed_field {
        median_value = median(&mut present).ok_or_else(|| {
            ChurnError::data_format(format!("'{field}' has no parseable values to impute from"))
        })?;
        for (row, name) in &missing_rows {
            records[*row].insert(name.clone(), FieldValue::Number(median_value));
        }
        if !missing_rows.is_empty() {
            tracing::warn!(
                "Imputed {} missing '{}' values with batch median {:.4}",
                missing_rows.len(),
                field,
                median_value
            );
        }
    }

    Ok(LoadedBatch {
        ids,
        records,
        labels: cols.label.map(|_| labels),
        median: median_value,
        imputed: missing_rows.len(),
    })
}

/// Lenient numeric coercion: `None` for anything that is not a finite number.
pub fn coerce_numeric(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Strict parse for fields that may not be imputed.
fn parse_required(text: &str, value_type: ValueType) -> Option<f64> {
    let v = coerce_numeric(text)?;
    if v < 0.0 {
        return None;
    }
    if value_type == ValueType::Integer && v.fract() != 0.0 {
        return None;
    }
    Some(v)
}

/// Median of `values`; the mean of the two middle values for an even count.
/// Sorts the slice in place. `None` when empty.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{csv_row as row, CSV_HEADER as HEADER};

    fn load(lines: &[String]) -> Result<LoadedBatch> {
        let csv = format!("{HEADER}\n{}\n", lines.join("\n"));
        load_from_reader(csv.as_bytes(), &Schema::telco(), true)
    }

    #[test]
    fn test_drops_identifier_and_splits_label() {
        let batch = load(&[
            row("7590-VHVEG", "1", "29.85", "29.85", "Month-to-month", "No"),
            row("5575-GNVDE", "34", "56.95", "1889.5", "One year", "Yes"),
        ])
        .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.ids[0].as_deref(), Some("7590-VHVEG"));
        assert!(batch.records[0].get(ID_FIELD).is_none());
        assert!(batch.records[0].get(LABEL_FIELD).is_none());
        assert_eq!(batch.records[0].len(), 19);
        assert_eq!(batch.labels, Some(vec![false, true]));
        assert_eq!(batch.records[1].get("tenure"), Some(&FieldValue::Number(34.0)));
    }

    #[test]
    fn test_blank_total_charges_gets_exact_batch_median() {
        let batch = load(&[
            row("a", "1", "20.0", "10.0", "Month-to-month", "No"),
            row("b", "2", "20.0", "30.0", "Month-to-month", "No"),
            row("c", "3", "20.0", "", "Two year", "No"),
            row("d", "4", "20.0", " ", "Two year", "Yes"),
            row("e", "5", "20.0", "50.0", "One year", "No"),
        ])
        .unwrap();

        // Parseable values 10, 30, 50 → median 30
        assert_eq!(batch.median, 30.0);
        assert_eq!(batch.imputed, 2);
        assert_eq!(batch.records[2].get("TotalCharges"), Some(&FieldValue::Number(30.0)));
        assert_eq!(batch.records[3].get("TotalCharges"), Some(&FieldValue::Number(30.0)));
        assert!(batch.median >= 0.0);
    }

    #[test]
    fn test_even_count_median_averages_middle_values() {
        let mut v = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(median(&mut v), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_missing_column_is_data_format_error() {
        let csv = "customerID,tenure\nx,1\n";
        let err = load_from_reader(csv.as_bytes(), &Schema::telco(), true).unwrap_err();
        assert!(matches!(err, ChurnError::DataFormat(_)));
    }

    #[test]
    fn test_missing_label_only_required_when_labelled() {
        let header = HEADER.trim_end_matches(",Churn");
        let line = row("a", "1", "20.0", "20.0", "One year", "No");
        let line = line.trim_end_matches(",No");
        let csv = format!("{header}\n{line}\n");

        assert!(load_from_reader(csv.as_bytes(), &Schema::telco(), true).is_err());
        let batch = load_from_reader(csv.as_bytes(), &Schema::telco(), false).unwrap();
        assert!(batch.labels.is_none());
    }

    #[test]
    fn test_unparseable_tenure_is_rejected() {
        let err = load(&[row("a", "abc", "20.0", "20.0", "One year", "No")]).unwrap_err();
        assert!(matches!(err, ChurnError::DataFormat(_)));
        let err = load(&[row("a", "1.5", "20.0", "20.0", "One year", "No")]).unwrap_err();
        assert!(matches!(err, ChurnError::DataFormat(_)));
    }

    #[test]
    fn test_bad_label_is_rejected() {
        let err = load(&[row("a", "1", "20.0", "20.0", "One year", "Maybe")]).unwrap_err();
        assert!(err.to_string().contains("Yes or No"));
    }

    #[test]
    fn test_all_total_charges_missing_is_rejected() {
        let err = load(&[row("a", "1", "20.0", " ", "One year", "No")]).unwrap_err();
        assert!(matches!(err, ChurnError::DataFormat(_)));
    }

    #[test]
    fn test_empty_source_is_rejected() {
        let err = load_from_reader(format!("{HEADER}\n").as_bytes(), &Schema::telco(), true);
        assert!(err.is_err());
    }
}
