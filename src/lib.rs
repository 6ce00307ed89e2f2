//! London house price prediction service.
//!
//! Startup fetches the model artifact once (or reuses the cached copy),
//! resolves it against the transform registry and then serves predictions
//! over HTTP from the shared, read-only predictor.

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod geocode;
pub mod models;
pub mod prediction;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{FeatureError, ModelError};
pub use features::FeatureRecord;
pub use prediction::PredictionService;
