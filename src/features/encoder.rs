//! One-hot feature encoding with an explicit, versioned column schema.
//!
//! Fitting on the training table fixes the [`FeatureSchema`]. Inference records are encoded
//! into `(column, value)` pairs and projected onto that schema with [`reindex`]: columns the
//! record lacks become `0`, columns the schema lacks are dropped.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::columns::{self, is_categorical};
use super::record::{RawRecord, RawValue};
use crate::dataset::DatasetTable;
use crate::error::EncodingError;

/// Bumped whenever the column naming or ordering rules change.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Ordered encoded column names shared by training and every prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSchema {
    version: u32,
    columns: Vec<String>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        let positions = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self {
            version: FEATURE_SCHEMA_VERSION,
            columns,
            positions,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Stable hex digest of the version and ordered column names.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.version.to_le_bytes());
        for column in &self.columns {
            hasher.update(column.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Project encoded `(column, value)` pairs onto `schema`.
///
/// The output always has `schema.len()` entries in schema order.
pub fn reindex(pairs: &[(String, f32)], schema: &FeatureSchema) -> Vec<f32> {
    let mut out = vec![0.0f32; schema.len()];
    for (column, value) in pairs {
        if let Some(idx) = schema.position(column) {
            out[idx] = *value;
        }
    }
    out
}

/// Indicator column name for a categorical value.
pub fn indicator_column(column: &str, value: &str) -> String {
    format!("{column}_{value}")
}

#[derive(Debug, Clone)]
struct FittedLayout {
    numeric: Vec<String>,
    categorical: Vec<String>,
    schema: FeatureSchema,
}

/// Converts raw records into fixed-width numeric vectors.
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    fitted: Option<FittedLayout>,
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema fixed by [`Self::fit_transform`].
    pub fn schema(&self) -> Result<&FeatureSchema, EncodingError> {
        self.fitted
            .as_ref()
            .map(|fitted| &fitted.schema)
            .ok_or(EncodingError::SchemaNotEstablished)
    }

    /// Establish the schema from the training table and encode every row.
    ///
    /// Only feature columns present in the table participate. Each categorical column
    /// contributes one indicator per observed value except the lexicographically first,
    /// which becomes the all-zero reference.
    pub fn fit_transform(&mut self, table: &DatasetTable) -> Result<Vec<Vec<f32>>, EncodingError> {
        if self.fitted.is_some() {
            return Err(EncodingError::SchemaAlreadyEstablished);
        }
        let (numeric, categorical): (Vec<String>, Vec<String>) = columns::feature_columns()
            .filter(|column| table.has_column(column))
            .map(str::to_string)
            .partition(|column| !is_categorical(column));

        let mut schema_columns = numeric.clone();
        for column in &categorical {
            let observed: BTreeSet<&str> = table
                .iter_rows()
                .filter_map(|row| row.cell(column))
                .collect();
            schema_columns.extend(
                observed
                    .into_iter()
                    .skip(1)
                    .map(|value| indicator_column(column, value)),
            );
        }

        let layout = FittedLayout {
            numeric,
            categorical,
            schema: FeatureSchema::new(schema_columns),
        };
        let matrix = table
            .iter_rows()
            .map(|row| layout.encode(&row))
            .collect::<Result<Vec<_>, _>>()?;
        self.fitted = Some(layout);
        Ok(matrix)
    }

    /// Encode one record onto the established schema.
    pub fn transform(&self, record: &dyn RawRecord) -> Result<Vec<f32>, EncodingError> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(EncodingError::SchemaNotEstablished)?;
        fitted.encode(record)
    }
}

impl FittedLayout {
    fn encode(&self, record: &dyn RawRecord) -> Result<Vec<f32>, EncodingError> {
        let pairs = self.encode_pairs(record)?;
        Ok(reindex(&pairs, &self.schema))
    }

    fn encode_pairs(&self, record: &dyn RawRecord) -> Result<Vec<(String, f32)>, EncodingError> {
        let mut pairs = Vec::with_capacity(self.numeric.len() + self.categorical.len());
        for column in &self.numeric {
            let value = match record.raw_value(column) {
                Some(raw) => numeric_value(column, raw)?,
                None => 0.0,
            };
            pairs.push((column.clone(), value));
        }
        for column in &self.categorical {
            match record.raw_value(column) {
                Some(RawValue::Text(text)) if !text.trim().is_empty() => {
                    pairs.push((indicator_column(column, text.trim()), 1.0));
                }
                Some(RawValue::Number(number)) => {
                    pairs.push((indicator_column(column, &number.to_string()), 1.0));
                }
                _ => {}
            }
        }
        Ok(pairs)
    }
}

/// Numeric cell value. Non-finite numbers, including ones that overflow `f32`, are rejected.
fn numeric_value(column: &str, raw: RawValue<'_>) -> Result<f32, EncodingError> {
    let invalid = |value: String| EncodingError::InvalidNumber {
        field: column.to_string(),
        value,
    };
    let number = match raw {
        RawValue::Number(number) => number,
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            match trimmed.to_ascii_lowercase().as_str() {
                "true" => 1.0,
                "false" => 0.0,
                _ => trimmed
                    .parse::<f64>()
                    .map_err(|_| invalid(trimmed.to_string()))?,
            }
        }
    };
    let value = number as f32;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(number.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TrainingRow;
    use crate::features::record::SymptomRecord;
    use std::path::PathBuf;

    fn table() -> DatasetTable {
        let headers = ["age", "gender", "primary_symptom_duration", "fever", "cough", "prognosis"]
            .map(str::to_string)
            .to_vec();
        let rows = [
            ["30", "Male", "3-7 days", "1", "1", "Common Cold"],
            ["25", "Female", "1-2 days", "1", "0", "Flu"],
            ["60", "Male", "> 2 weeks", "0", "1", "Bronchitis"],
            ["41", "Female", "3-7 days", "", "1", "Common Cold"],
        ]
        .map(|cells| TrainingRow {
            label: cells[5].to_string(),
            cells: cells.map(str::to_string).to_vec(),
        })
        .to_vec();
        DatasetTable::from_rows(PathBuf::from("memory.csv"), headers, rows, 1)
    }

    #[test]
    fn fit_establishes_ordered_schema_with_dropped_reference() {
        let mut encoder = FeatureEncoder::new();
        let matrix = encoder.fit_transform(&table()).unwrap();
        let schema = encoder.schema().unwrap();
        assert_eq!(
            schema.columns(),
            &[
                "age",
                "fever",
                "cough",
                "gender_Male",
                "primary_symptom_duration_3-7 days",
                "primary_symptom_duration_> 2 weeks",
            ]
        );
        assert_eq!(matrix.len(), 4);
        assert_eq!(matrix[0], vec![30.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
        assert_eq!(matrix[1], vec![25.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(matrix[3], vec![41.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn transform_before_fit_is_an_encoding_error() {
        let encoder = FeatureEncoder::new();
        let record = SymptomRecord::new(30, "Male", "3-7 days");
        assert!(matches!(
            encoder.transform(&record),
            Err(EncodingError::SchemaNotEstablished)
        ));
        assert!(encoder.schema().is_err());
    }

    #[test]
    fn schema_is_fixed_after_first_fit() {
        let mut encoder = FeatureEncoder::new();
        encoder.fit_transform(&table()).unwrap();
        assert!(matches!(
            encoder.fit_transform(&table()),
            Err(EncodingError::SchemaAlreadyEstablished)
        ));
    }

    #[test]
    fn unseen_category_maps_to_zero_indicators() {
        let mut encoder = FeatureEncoder::new();
        encoder.fit_transform(&table()).unwrap();
        let record = SymptomRecord::new(33, "Nonbinary", "6 months").with_symptom("fever", true);
        let encoded = encoder.transform(&record).unwrap();
        assert_eq!(encoded, vec![33.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn inference_encoding_is_deterministic() {
        let mut encoder = FeatureEncoder::new();
        encoder.fit_transform(&table()).unwrap();
        let record = SymptomRecord::new(30, "Male", "> 2 weeks").with_symptom("cough", true);
        let first = encoder.transform(&record).unwrap();
        let second = encoder.transform(&record).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec![30.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn reindex_fills_missing_and_drops_extra_columns() {
        let schema = FeatureSchema::new(vec!["a".into(), "b".into(), "c".into()]);
        let pairs = vec![
            ("c".to_string(), 3.0),
            ("extra".to_string(), 9.0),
            ("a".to_string(), 1.0),
        ];
        assert_eq!(reindex(&pairs, &schema), vec![1.0, 0.0, 3.0]);
    }

    #[test]
    fn fingerprint_tracks_column_order() {
        let ab = FeatureSchema::new(vec!["a".into(), "b".into()]);
        let ba = FeatureSchema::new(vec!["b".into(), "a".into()]);
        assert_eq!(ab.fingerprint(), ab.clone().fingerprint());
        assert_ne!(ab.fingerprint(), ba.fingerprint());
        assert_eq!(ab.version(), FEATURE_SCHEMA_VERSION);
    }

    #[test]
    fn non_finite_numeric_cells_are_rejected() {
        let headers = ["age", "fever", "prognosis"].map(str::to_string).to_vec();
        for age in ["NaN", "inf", "-inf", "1e40"] {
            let rows = vec![TrainingRow {
                label: "Flu".into(),
                cells: [age, "1", "Flu"].map(str::to_string).to_vec(),
            }];
            let table =
                DatasetTable::from_rows(PathBuf::from("memory.csv"), headers.clone(), rows, 1);
            let err = FeatureEncoder::new().fit_transform(&table).unwrap_err();
            assert!(
                matches!(err, EncodingError::InvalidNumber { ref field, .. } if field == "age"),
                "{age} should be rejected"
            );
        }
    }

    #[test]
    fn non_finite_record_value_is_rejected_at_inference() {
        struct AgeOnly(f64);
        impl RawRecord for AgeOnly {
            fn raw_value(&self, column: &str) -> Option<RawValue<'_>> {
                (column == "age").then_some(RawValue::Number(self.0))
            }
        }
        let mut encoder = FeatureEncoder::new();
        encoder.fit_transform(&table()).unwrap();
        assert!(encoder.transform(&AgeOnly(42.0)).is_ok());
        assert!(matches!(
            encoder.transform(&AgeOnly(f64::NAN)),
            Err(EncodingError::InvalidNumber { ref field, .. }) if field == "age"
        ));
    }

    #[test]
    fn non_numeric_symptom_cell_is_rejected() {
        let headers = ["age", "fever", "prognosis"].map(str::to_string).to_vec();
        let rows = vec![TrainingRow {
            label: "Flu".into(),
            cells: ["30", "often", "Flu"].map(str::to_string).to_vec(),
        }];
        let table = DatasetTable::from_rows(PathBuf::from("memory.csv"), headers, rows, 1);
        let err = FeatureEncoder::new().fit_transform(&table).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidNumber { ref field, .. } if field == "fever"));
    }
}
