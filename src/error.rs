//! Error taxonomy for the prediction core.
//!
//! Dataset and training failures are fatal to the [`crate::service::ModelService`] and are
//! stored behind an `Arc` so every caller observes the same failure. Encoding and prediction
//! failures are local to a single request.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// The dataset is missing a column the loader requires.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Target column '{column}' not found in dataset {path}")]
    MissingLabelColumn { column: String, path: PathBuf },
}

/// Failures while reading the dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open dataset {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed dataset {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// The filtered dataset cannot produce a classifier.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Dataset is empty after filtering; model cannot be trained")]
    EmptyDataset,
    #[error("Label column is degenerate: only '{label}' survived filtering")]
    DegenerateLabels { label: String },
    #[error("Feature matrix has {rows} rows but {labels} labels")]
    MismatchedRows { rows: usize, labels: usize },
    #[error("Label index {index} is outside the {classes} known classes")]
    UnknownClassIndex { index: usize, classes: usize },
    #[error("Feature schema has {schema} columns but the model expects {model}")]
    SchemaMismatch { schema: usize, model: usize },
    #[error("Failed to build training thread pool: {0}")]
    ThreadPool(String),
}

/// Encoding contract violations and values that cannot be turned into numbers.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Feature schema has not been established; fit the encoder on training data first")]
    SchemaNotEstablished,
    #[error("Feature schema is already established and cannot be recomputed")]
    SchemaAlreadyEstablished,
    #[error("Field '{field}' expects a number, got '{value}'")]
    InvalidNumber { field: String, value: String },
}

/// A single request could not be turned into a probability distribution.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Prediction error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("Prediction error: expected {expected} features, got {found}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("Prediction error: feature '{column}' is not finite")]
    NonFinite { column: String },
    #[error("Prediction error: model returned an empty distribution")]
    EmptyDistribution,
}

/// Fatal failures of the one-time initialization. Sticky once recorded.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Training(#[from] TrainingError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("Model initialization panicked: {0}")]
    Panicked(String),
}

impl From<SchemaError> for InitError {
    fn from(error: SchemaError) -> Self {
        Self::Dataset(DatasetError::Schema(error))
    }
}

/// Readiness failures reported by the model service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("The prediction model is not available: {0}")]
    Unavailable(Arc<InitError>),
    #[error("Model service state lock poisoned")]
    Poisoned,
}

/// Raw request input does not satisfy the input contract.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("Missing one or more mandatory fields: {0:?}")]
    MissingFields(Vec<String>),
    #[error("Field '{field}' is invalid: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Outcome classes the serving layer must tell apart.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    InvalidInput(#[from] RecordError),
    #[error(transparent)]
    Unavailable(#[from] ServiceError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// Failures while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config format in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error(transparent)]
    AppDir(#[from] crate::app_dirs::AppDirError),
}
