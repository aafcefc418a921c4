//! Library exports for reuse in the binary, benchmarks, and tests.
/// Per-user application directory resolution.
pub mod app_dirs;
/// Request-level symptom checks.
pub mod checker;
/// TOML configuration.
pub mod config;
/// Dataset loading and treatment metadata.
pub mod dataset;
/// Error types shared across the crate.
pub mod error;
/// Input vocabulary, raw records, and the feature encoder.
pub mod features;
/// Tracing subscriber setup.
pub mod logging;
/// Classifier training and inference.
pub mod ml;
/// Trained predictor and prediction results.
pub mod predictor;
/// Lazily trained process-wide model service.
pub mod service;

pub use checker::{SymptomChecker, SymptomReport};
pub use config::PredictorConfig;
pub use error::{CheckError, InitError, PredictionError, ServiceError};
pub use predictor::{PredictionResult, Predictor};
pub use service::{ModelService, PredictorLoader, ServiceState, ServiceStatus};
