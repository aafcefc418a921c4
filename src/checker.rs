//! Request-level entry point: validate raw input, predict, attach treatment metadata.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::dataset::TreatmentPlan;
use crate::error::CheckError;
use crate::features::SymptomRecord;
use crate::predictor::PredictionResult;
use crate::service::ModelService;

/// Response body for one symptom check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomReport {
    pub predicted_disease: String,
    pub confidence: f64,
    pub top_3_predictions: Vec<(String, f64)>,
    /// `None` when the dataset carries no treatment entry for the predicted label.
    /// Serialized as top-level `allopathic_treatment` and `ayurvedic_treatment` keys.
    #[serde(flatten)]
    pub treatment: Option<TreatmentPlan>,
}

impl SymptomReport {
    fn new(prediction: PredictionResult, treatment: Option<TreatmentPlan>) -> Self {
        Self {
            predicted_disease: prediction.predicted_disease,
            confidence: prediction.confidence,
            top_3_predictions: prediction.top_3_predictions,
            treatment,
        }
    }
}

/// Handler-facing wrapper around a shared [`ModelService`].
#[derive(Debug, Clone)]
pub struct SymptomChecker {
    service: Arc<ModelService>,
}

impl SymptomChecker {
    pub fn new(service: Arc<ModelService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<ModelService> {
        &self.service
    }

    /// Run one check against a JSON request body.
    ///
    /// Input is validated before the model is touched, so malformed requests never trigger
    /// training.
    pub fn check(&self, body: &Value) -> Result<SymptomReport, CheckError> {
        let record = SymptomRecord::from_json(body)?;
        self.check_record(&record)
    }

    /// Run one check against an already validated record.
    pub fn check_record(&self, record: &SymptomRecord) -> Result<SymptomReport, CheckError> {
        let predictor = self.service.get_predictor()?;
        let prediction = predictor.predict(record)?;
        let treatment = predictor.treatment_for(&prediction.predicted_disease);
        if treatment.is_none() {
            debug!(
                "No treatment metadata for '{}'",
                prediction.predicted_disease
            );
        }
        Ok(SymptomReport::new(prediction, treatment))
    }
}
