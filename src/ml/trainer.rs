//! Classifier training: label indexing, hold-out split, forest fit, validation report.

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::forest::{ForestOptions, RandomForestModel, TrainDataset, train_forest};
use super::metrics::{ConfusionMatrix, accuracy, precision_recall_by_class};
use super::split::train_validation_split;
use crate::config::TrainingSettings;
use crate::error::TrainingError;

/// Observability summary of one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub validation_rows: usize,
    /// Whether the hold-out split preserved per-class proportions.
    pub stratified: bool,
    /// `None` when the validation partition is empty.
    pub validation_accuracy: Option<f32>,
}

/// Fitted model plus how it was obtained.
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    pub model: RandomForestModel,
    pub report: TrainingReport,
}

/// Fit the forest on the training partition of `x`/`labels` and score the rest.
///
/// Classes are the distinct labels in sorted order. Accuracy is reported, never enforced.
pub fn train_classifier(
    x: Vec<Vec<f32>>,
    labels: &[String],
    feature_len: usize,
    settings: &TrainingSettings,
) -> Result<TrainedClassifier, TrainingError> {
    if x.len() != labels.len() {
        return Err(TrainingError::MismatchedRows {
            rows: x.len(),
            labels: labels.len(),
        });
    }
    if x.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }
    let classes: Vec<String> = labels
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if classes.len() < 2 {
        return Err(TrainingError::DegenerateLabels {
            label: classes.into_iter().next().unwrap_or_default(),
        });
    }
    let y: Vec<usize> = labels
        .iter()
        .map(|label| classes.binary_search(label).unwrap_or_default())
        .collect();

    let split = train_validation_split(&y, settings.test_fraction, settings.seed);
    let mut rows: Vec<Option<Vec<f32>>> = x.into_iter().map(Some).collect();
    let mut take = |indices: &[usize]| -> (Vec<Vec<f32>>, Vec<usize>) {
        indices
            .iter()
            .filter_map(|&idx| rows[idx].take().map(|row| (row, y[idx])))
            .unzip()
    };
    let (train_x, train_y) = take(&split.train);
    let (val_x, val_y) = take(&split.validation);

    let train = TrainDataset {
        feature_len_f32: feature_len,
        classes,
        x: train_x,
        y: train_y,
    };
    info!(
        "Training forest: {} estimators on {} rows, {} features, {} classes",
        settings.n_estimators,
        train.x.len(),
        feature_len,
        train.classes.len()
    );
    let model = train_forest(&train, &ForestOptions::from(settings))?;

    let validation_accuracy = if val_x.is_empty() {
        None
    } else {
        let mut cm = ConfusionMatrix::new(model.classes.len());
        for (row, &truth) in val_x.iter().zip(&val_y) {
            cm.add(truth, model.predict_class_index(row));
        }
        for (class, stats) in model.classes.iter().zip(precision_recall_by_class(&cm)) {
            debug!(
                "class {class:<24} precision={:.3} recall={:.3} support={}",
                stats.precision, stats.recall, stats.support
            );
        }
        Some(accuracy(&cm))
    };
    match validation_accuracy {
        Some(acc) => info!("Model training complete; validation accuracy: {acc:.4}"),
        None => info!("Model training complete; no validation rows held out"),
    }

    Ok(TrainedClassifier {
        model,
        report: TrainingReport {
            train_rows: train.x.len(),
            validation_rows: val_x.len(),
            stratified: split.stratified,
            validation_accuracy,
        },
    })
}
