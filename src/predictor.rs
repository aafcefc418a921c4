//! Trained predictor: encoder, forest, and the retained dataset behind one immutable value.

use std::cmp::Ordering;

use serde::Serialize;

use crate::config::TrainingSettings;
use crate::dataset::{DatasetTable, TreatmentPlan};
use crate::error::{InitError, PredictionError, TrainingError};
use crate::features::encoder::{FeatureEncoder, FeatureSchema};
use crate::features::record::RawRecord;
use crate::ml::forest::RandomForestModel;
use crate::ml::trainer::{TrainedClassifier, TrainingReport, train_classifier};

/// Number of ranked alternatives returned per prediction.
pub const TOP_K: usize = 3;

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_disease: String,
    /// Probability of `predicted_disease`, rounded to 4 decimals.
    pub confidence: f64,
    /// Up to [`TOP_K`] `(label, probability)` pairs, most probable first.
    pub top_3_predictions: Vec<(String, f64)>,
}

/// Round to 4 decimal places.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Read-only prediction state published once training succeeds.
#[derive(Debug)]
pub struct Predictor {
    encoder: FeatureEncoder,
    schema: FeatureSchema,
    schema_fingerprint: String,
    model: RandomForestModel,
    table: DatasetTable,
    report: TrainingReport,
}

impl Predictor {
    /// Encode the table, fit the classifier, and assemble a predictor.
    pub fn train(table: DatasetTable, settings: &TrainingSettings) -> Result<Self, InitError> {
        if table.is_empty() {
            return Err(TrainingError::EmptyDataset.into());
        }
        let mut encoder = FeatureEncoder::new();
        let x = encoder.fit_transform(&table)?;
        let feature_len = encoder.schema()?.len();
        let labels: Vec<String> = table.rows.iter().map(|row| row.label.clone()).collect();
        let trained = train_classifier(x, &labels, feature_len, settings)?;
        Self::new(encoder, trained, table)
    }

    /// Pair a fitted encoder with a classifier trained on its output.
    pub fn new(
        encoder: FeatureEncoder,
        trained: TrainedClassifier,
        table: DatasetTable,
    ) -> Result<Self, InitError> {
        let schema = encoder.schema()?.clone();
        if schema.len() != trained.model.n_features {
            return Err(TrainingError::SchemaMismatch {
                schema: schema.len(),
                model: trained.model.n_features,
            }
            .into());
        }
        let schema_fingerprint = schema.fingerprint();
        Ok(Self {
            encoder,
            schema,
            schema_fingerprint,
            model: trained.model,
            table,
            report: trained.report,
        })
    }

    /// Column layout every encoded vector must follow.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Digest of the schema version and column order, computed once at construction.
    pub fn schema_fingerprint(&self) -> &str {
        &self.schema_fingerprint
    }

    /// Class labels in the model's internal order.
    pub fn classes(&self) -> &[String] {
        &self.model.classes
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    /// Filtered dataset the model was trained from.
    pub fn table(&self) -> &DatasetTable {
        &self.table
    }

    pub fn treatment_for(&self, label: &str) -> Option<TreatmentPlan> {
        TreatmentPlan::lookup(&self.table, label)
    }

    /// Encode a raw record onto the training schema.
    pub fn encode(&self, record: &dyn RawRecord) -> Result<Vec<f32>, PredictionError> {
        Ok(self.encoder.transform(record)?)
    }

    /// Encode and predict in one step.
    pub fn predict(&self, record: &dyn RawRecord) -> Result<PredictionResult, PredictionError> {
        let features = self.encode(record)?;
        self.predict_encoded(&features)
    }

    /// Full probability distribution over [`Self::classes`] for an encoded vector.
    pub fn distribution(&self, features: &[f32]) -> Result<Vec<f64>, PredictionError> {
        let schema = &self.schema;
        if features.len() != schema.len() {
            return Err(PredictionError::ShapeMismatch {
                expected: schema.len(),
                found: features.len(),
            });
        }
        if let Some(idx) = features.iter().position(|v| !v.is_finite()) {
            return Err(PredictionError::NonFinite {
                column: schema.columns()[idx].clone(),
            });
        }
        let proba = self.model.predict_proba(features);
        if proba.is_empty() {
            return Err(PredictionError::EmptyDistribution);
        }
        Ok(proba)
    }

    /// Argmax label, its rounded probability, and the top ranked alternatives.
    ///
    /// Equal probabilities keep the model's class order.
    pub fn predict_encoded(&self, features: &[f32]) -> Result<PredictionResult, PredictionError> {
        let proba = self.distribution(features)?;
        let mut ranked: Vec<usize> = (0..proba.len()).collect();
        ranked.sort_by(|&a, &b| proba[b].partial_cmp(&proba[a]).unwrap_or(Ordering::Equal));

        let best = ranked[0];
        Ok(PredictionResult {
            predicted_disease: self.model.classes[best].clone(),
            confidence: round4(proba[best]),
            top_3_predictions: ranked
                .iter()
                .take(TOP_K)
                .map(|&idx| (self.model.classes[idx].clone(), round4(proba[idx])))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TrainingRow;
    use crate::error::EncodingError;
    use crate::features::record::SymptomRecord;
    use std::path::PathBuf;

    fn table() -> DatasetTable {
        let headers = ["age", "gender", "primary_symptom_duration", "fever", "cough", "headache", "prognosis"]
            .map(str::to_string)
            .to_vec();
        let row = |cells: [&str; 7]| TrainingRow {
            label: cells[6].to_string(),
            cells: cells.map(str::to_string).to_vec(),
        };
        let mut rows = Vec::new();
        for i in 0..12 {
            let age = (20 + i).to_string();
            let gender = if i % 2 == 0 { "Male" } else { "Female" };
            rows.push(row([&age, gender, "3-7 days", "1", "1", "0", "Common Cold"]));
            rows.push(row([&age, gender, "1-2 days", "0", "0", "1", "Migraine"]));
        }
        for i in 0..6 {
            let age = (50 + i).to_string();
            rows.push(row([&age, "Male", "> 2 weeks", "1", "0", "1", "Dengue"]));
        }
        DatasetTable::from_rows(PathBuf::from("memory.csv"), headers, rows, 2)
    }

    fn settings() -> TrainingSettings {
        TrainingSettings {
            n_estimators: 30,
            threads: 2,
            ..TrainingSettings::default()
        }
    }

    #[test]
    fn round4_keeps_four_decimals() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(1.0), 1.0);
    }

    #[test]
    fn prediction_is_consistent_with_distribution() {
        let predictor = Predictor::train(table(), &settings()).unwrap();
        let record = SymptomRecord::new(30, "Male", "3-7 days")
            .with_symptom("fever", true)
            .with_symptom("cough", true);
        let features = predictor.encode(&record).unwrap();
        let proba = predictor.distribution(&features).unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));

        let result = predictor.predict(&record).unwrap();
        assert_eq!(result.predicted_disease, "Common Cold");
        assert!(result.confidence > 0.5);
        assert_eq!(result.top_3_predictions.len(), 3);
        assert_eq!(result.top_3_predictions[0].0, result.predicted_disease);
        assert_eq!(result.top_3_predictions[0].1, result.confidence);
        assert!(
            result
                .top_3_predictions
                .windows(2)
                .all(|pair| pair[0].1 >= pair[1].1)
        );
        let best = predictor.model.predict_class_index(&features);
        assert_eq!(predictor.classes()[best], result.predicted_disease);
    }

    #[test]
    fn repeated_predictions_are_identical() {
        let predictor = Predictor::train(table(), &settings()).unwrap();
        let record = SymptomRecord::new(52, "Male", "> 2 weeks")
            .with_symptom("fever", true)
            .with_symptom("headache", true);
        assert_eq!(
            predictor.predict(&record).unwrap(),
            predictor.predict(&record).unwrap()
        );
    }

    #[test]
    fn unseen_category_still_predicts() {
        let predictor = Predictor::train(table(), &settings()).unwrap();
        let record = SymptomRecord::new(30, "Unspecified", "a long time").with_symptom("headache", true);
        assert!(predictor.predict(&record).is_ok());
    }

    #[test]
    fn malformed_encoded_vectors_are_prediction_errors() {
        let predictor = Predictor::train(table(), &settings()).unwrap();
        let width = predictor.schema().len();
        assert!(matches!(
            predictor.predict_encoded(&[1.0]),
            Err(PredictionError::ShapeMismatch { found: 1, .. })
        ));
        let mut features = vec![0.0; width];
        features[0] = f32::NAN;
        assert!(matches!(
            predictor.predict_encoded(&features),
            Err(PredictionError::NonFinite { ref column }) if column == "age"
        ));
    }

    #[test]
    fn two_classes_yield_two_ranked_entries() {
        let mut table = table();
        table.rows.retain(|row| row.label != "Dengue");
        let predictor = Predictor::train(table, &settings()).unwrap();
        let result = predictor
            .predict(&SymptomRecord::new(25, "Female", "1-2 days").with_symptom("headache", true))
            .unwrap();
        assert_eq!(result.top_3_predictions.len(), 2);
        assert_eq!(result.predicted_disease, "Migraine");
    }

    #[test]
    fn schema_fingerprint_is_published_with_the_model() {
        let predictor = Predictor::train(table(), &settings()).unwrap();
        assert_eq!(predictor.schema_fingerprint(), predictor.schema().fingerprint());
        assert_eq!(predictor.schema_fingerprint().len(), 64);
        let retrained = Predictor::train(table(), &settings()).unwrap();
        assert_eq!(retrained.schema_fingerprint(), predictor.schema_fingerprint());
    }

    #[test]
    fn non_finite_training_cells_fail_training() {
        let mut table = table();
        table.rows[0].cells[0] = "NaN".to_string();
        table.rows[1].cells[0] = "inf".to_string();
        let err = Predictor::train(table, &settings()).unwrap_err();
        assert!(matches!(
            err,
            InitError::Encoding(EncodingError::InvalidNumber { ref field, .. }) if field == "age"
        ));
    }

    #[test]
    fn empty_table_fails_training() {
        let mut table = table();
        table.rows.clear();
        let err = Predictor::train(table, &settings()).unwrap_err();
        assert!(matches!(err, InitError::Training(TrainingError::EmptyDataset)));
    }

    #[test]
    fn treatment_lookup_misses_are_not_errors() {
        let predictor = Predictor::train(table(), &settings()).unwrap();
        let plan = predictor.treatment_for("Common Cold").unwrap();
        assert_eq!(plan.allopathic_treatment.medicine_name, "N/A");
        assert!(predictor.treatment_for("Unknown Disease").is_none());
    }
}
