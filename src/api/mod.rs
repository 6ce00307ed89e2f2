//! HTTP surface for the price model.
//!
//! ## Endpoints
//!
//! - `GET /` - Input form
//! - `GET /health` - Liveness plus whether the model artifact is cached
//! - `POST /predict` - JSON prediction, all ten features required
//! - `POST /predict-form` - Form prediction rendered into the page

pub mod handlers;
pub mod page;
pub mod types;

use crate::prediction::PredictionService;
use axum::{
    routing::{get, post},
    Router,
};
use page::PageRenderer;
use std::path::PathBuf;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    service: PredictionService,
    model_path: Arc<PathBuf>,
    page: Arc<PageRenderer>,
}

impl AppState {
    /// # Arguments
    ///
    /// * `service` - Prediction service over the already-loaded model
    /// * `model_path` - Cache file reported by `/health`
    pub fn new(service: PredictionService, model_path: impl Into<PathBuf>) -> Result<Self, minijinja::Error> {
        Ok(Self {
            service,
            model_path: Arc::new(model_path.into()),
            page: Arc::new(PageRenderer::new()?),
        })
    }

    /// Reflects the cache file on disk, not the in-memory predictor.
    pub fn model_cached(&self) -> bool {
        self.model_path.exists()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .route("/predict-form", post(handlers::predict_form))
        .with_state(state)
}
