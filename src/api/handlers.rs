use super::types::{ErrorResponse, HealthResponse, PredictResponse};
use super::AppState;
use crate::error::FeatureError;
use crate::features::FeatureRecord;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, warn};

pub const CURRENCY: &str = "GBP";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<FeatureError> for ApiError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::MissingFields(_) => ApiError::BadRequest(err.to_string()),
            // Numeric coercion failures on the JSON path are server errors.
            FeatureError::NotNumeric { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(err: minijinja::Error) -> Self {
        ApiError::Internal(format!("template error: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => {
                warn!(%message, "rejected request");
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::Internal(message) => {
                error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(state.page.render_form(state.model_cached())?))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: state.model_cached(),
    })
}

/// JSON prediction. The body is parsed as JSON whatever its content type.
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;
    let Value::Object(payload) = payload else {
        return Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let prediction = state.service.predict_json(&payload)?;
    if !prediction.is_finite() {
        return Err(ApiError::Internal(format!(
            "model produced a non-finite prediction: {}",
            prediction
        )));
    }
    debug!(prediction, "json prediction");
    Ok(Json(PredictResponse {
        prediction,
        currency: CURRENCY.to_string(),
    }))
}

/// Form prediction. Coordinates come from the postcode area and malformed
/// numbers are treated as zero rather than rejected.
pub async fn predict_form(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Html<String>, ApiError> {
    let record = FeatureRecord::from_form(&form);
    let prediction = state.service.predict(&record);
    debug!(prediction, postcode_area = %record.postcode_area, "form prediction");
    let page = state
        .page
        .render_prediction(state.model_cached(), prediction, &record)?;
    Ok(Html(page))
}
