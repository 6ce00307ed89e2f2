use crate::error::FeatureError;
use crate::features::FeatureRecord;
use crate::models::PricePredictor;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Stateless front for the loaded predictor. Every call recomputes.
#[derive(Clone)]
pub struct PredictionService {
    predictor: Arc<PricePredictor>,
}

impl PredictionService {
    pub fn new(predictor: Arc<PricePredictor>) -> Self {
        Self { predictor }
    }

    pub fn predict(&self, record: &FeatureRecord) -> f64 {
        self.predict_many(std::slice::from_ref(record))[0]
    }

    pub fn predict_many(&self, records: &[FeatureRecord]) -> Vec<f64> {
        self.predictor.predict(records)
    }

    /// Validates and coerces a keyed mapping, then predicts.
    pub fn predict_json(&self, payload: &Map<String, Value>) -> Result<f64, FeatureError> {
        let record = FeatureRecord::from_json_map(payload)?;
        Ok(self.predict(&record))
    }
}
