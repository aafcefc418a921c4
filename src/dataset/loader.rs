//! Dataset loader for labeled symptom tables.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{DatasetError, SchemaError};
use crate::features::record::{RawRecord, RawValue};

/// One labeled example, cells aligned with [`DatasetTable::headers`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub label: String,
    pub cells: Vec<String>,
}

/// Filtered dataset retained for training and later treatment lookups.
#[derive(Debug, Clone)]
pub struct DatasetTable {
    /// File the table was read from.
    pub path: PathBuf,
    /// Column names in file order, label column included.
    pub headers: Vec<String>,
    /// Rows whose label met the minimum-support threshold.
    pub rows: Vec<TrainingRow>,
    /// Labels removed for having too few rows, with their counts.
    pub dropped_labels: BTreeMap<String, usize>,
    column_index: HashMap<String, usize>,
}

impl DatasetTable {
    /// Build a table from rows already in memory and drop under-represented labels.
    pub fn from_rows(
        path: PathBuf,
        headers: Vec<String>,
        rows: Vec<TrainingRow>,
        min_samples: usize,
    ) -> Self {
        let (rows, dropped_labels) = filter_by_support(rows, min_samples);
        let column_index = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self {
            path,
            headers,
            rows,
            dropped_labels,
            column_index,
        }
    }

    /// Surviving labels in deterministic (sorted) order.
    pub fn labels(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index.contains_key(column)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Borrow row `idx` as an encoder input.
    pub fn row(&self, idx: usize) -> Option<RowView<'_>> {
        self.rows.get(idx).map(|row| RowView { table: self, row })
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|row| RowView { table: self, row })
    }

    /// First row carrying `label`.
    pub fn first_row_for(&self, label: &str) -> Option<RowView<'_>> {
        self.iter_rows().find(|view| view.row.label == label)
    }
}

/// A table row paired with its header lookup.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a DatasetTable,
    pub row: &'a TrainingRow,
}

impl<'a> RowView<'a> {
    /// Trimmed cell text, `None` when the column is absent or the cell is blank.
    pub fn cell(&self, column: &str) -> Option<&'a str> {
        let idx = *self.table.column_index.get(column)?;
        let text = self.row.cells.get(idx)?.trim();
        if text.is_empty() { None } else { Some(text) }
    }
}

impl RawRecord for RowView<'_> {
    fn raw_value(&self, column: &str) -> Option<RawValue<'_>> {
        self.cell(column).map(RawValue::Text)
    }
}

/// Load a CSV dataset, requiring `label_column` and dropping labels with fewer than
/// `min_samples` rows. Rows with a blank label are skipped.
pub fn load_dataset(
    path: &Path,
    label_column: &str,
    min_samples: usize,
) -> Result<DatasetTable, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_error = |source: csv::Error| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();
    let label_idx = headers
        .iter()
        .position(|name| name == label_column)
        .ok_or_else(|| SchemaError::MissingLabelColumn {
            column: label_column.to_string(),
            path: path.to_path_buf(),
        })?;

    let mut rows = Vec::new();
    let mut unlabeled = 0usize;
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let label = record.get(label_idx).unwrap_or_default().to_string();
        if label.is_empty() {
            unlabeled += 1;
            continue;
        }
        rows.push(TrainingRow {
            label,
            cells: record.iter().map(str::to_string).collect(),
        });
    }
    if unlabeled > 0 {
        debug!("Skipped {unlabeled} unlabeled rows in {}", path.display());
    }

    let table = DatasetTable::from_rows(path.to_path_buf(), headers, rows, min_samples);
    info!(
        "Dataset loaded: {} samples across {} diseases ({} dropped below {} samples)",
        table.len(),
        table.labels().len(),
        table.dropped_labels.len(),
        min_samples
    );
    Ok(table)
}

fn filter_by_support(
    rows: Vec<TrainingRow>,
    min_samples: usize,
) -> (Vec<TrainingRow>, BTreeMap<String, usize>) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in &rows {
        *counts.entry(row.label.clone()).or_default() += 1;
    }
    let min_required = min_samples.max(1);
    let kept = rows
        .into_iter()
        .filter(|row| counts.get(&row.label).copied().unwrap_or(0) >= min_required)
        .collect();
    counts.retain(|_, count| *count < min_required);
    (kept, counts)
}
