//! TOML configuration for dataset loading, training, and logging.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app_dirs;
use crate::error::ConfigError;

/// Default filename used to store the configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Aggregate configuration for one predictor process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the labeled dataset lives and how it is filtered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSettings {
    /// CSV file with one row per labeled example.
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
    /// Column holding the disease label.
    #[serde(default = "default_label_column")]
    pub label_column: String,
    /// Labels with fewer rows than this are dropped before training.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            label_column: default_label_column(),
            min_samples: default_min_samples(),
        }
    }
}

/// Forest hyperparameters and split policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Fraction of rows held out for validation accuracy.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Worker threads for tree fitting; `0` uses every available core.
    #[serde(default)]
    pub threads: usize,
    /// Weight classes inversely to their frequency.
    #[serde(default = "default_true")]
    pub balance_classes: bool,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            test_fraction: default_test_fraction(),
            seed: default_seed(),
            threads: 0,
            balance_classes: true,
        }
    }
}

/// Tracing output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Fallback filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Write a log file in addition to stdout.
    #[serde(default = "default_true")]
    pub file: bool,
    /// Log directory; defaults to `.aarogya/logs`.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: true,
            directory: None,
            max_files: default_max_log_files(),
        }
    }
}

impl PredictorConfig {
    /// Reject values that would make training impossible or meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.min_samples == 0 {
            return Err(invalid("dataset.min_samples", "must be at least 1"));
        }
        if self.dataset.label_column.trim().is_empty() {
            return Err(invalid("dataset.label_column", "must not be empty"));
        }
        let training = &self.training;
        if training.n_estimators == 0 {
            return Err(invalid("training.n_estimators", "must be at least 1"));
        }
        if training.max_depth == 0 {
            return Err(invalid("training.max_depth", "must be at least 1"));
        }
        if training.min_samples_split < 2 {
            return Err(invalid("training.min_samples_split", "must be at least 2"));
        }
        if training.min_samples_leaf == 0 {
            return Err(invalid("training.min_samples_leaf", "must be at least 1"));
        }
        if !(training.test_fraction > 0.0 && training.test_fraction < 1.0) {
            return Err(invalid(
                "training.test_fraction",
                &format!("{} is outside (0, 1)", training.test_fraction),
            ));
        }
        Ok(())
    }
}

/// Resolve the configuration file path inside the application directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from the application directory, returning defaults if missing.
pub fn load_or_default() -> Result<PredictorConfig, ConfigError> {
    let path = config_path()?;
    if path.exists() {
        load_from(&path)
    } else {
        Ok(PredictorConfig::default())
    }
}

/// Load and validate a configuration file.
///
/// A relative `dataset.path` is resolved against the directory containing the file.
pub fn load_from(path: &Path) -> Result<PredictorConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: PredictorConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if config.dataset.path.is_relative()
        && let Some(parent) = path.parent()
    {
        config.dataset.path = parent.join(&config.dataset.path);
    }
    config.validate()?;
    Ok(config)
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("dataset.csv")
}

fn default_label_column() -> String {
    "prognosis".to_string()
}

fn default_min_samples() -> usize {
    5
}

fn default_n_estimators() -> usize {
    300
}

fn default_max_depth() -> usize {
    20
}

fn default_min_samples_split() -> usize {
    5
}

fn default_min_samples_leaf() -> usize {
    2
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    10
}

fn default_true() -> bool {
    true
}
