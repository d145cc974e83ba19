use crate::{
    diseases,
    inference::{predict_image, InferenceError},
    routes::{read_image_field, ErrorBody, ImageFieldError},
    server::SharedState,
    storage::UploadStoreError,
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum PredictRouteError {
    #[error("{0}")]
    Upload(#[from] ImageFieldError),
    #[error("{0}")]
    Store(#[from] UploadStoreError),
    #[error("prediction failed: {0}")]
    Inference(#[from] InferenceError),
}

impl IntoResponse for PredictRouteError {
    fn into_response(self) -> Response {
        let status = match &self {
            PredictRouteError::Upload(_) => StatusCode::BAD_REQUEST,
            PredictRouteError::Store(UploadStoreError::TooLarge { .. }) => {
                StatusCode::BAD_REQUEST
            }
            PredictRouteError::Store(_) | PredictRouteError::Inference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "predict request failed");
        }

        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[derive(Serialize)]
pub struct PredictResponse {
    status: &'static str,
    message: &'static str,
    data: PredictionReport,
}

#[derive(Serialize)]
pub struct PredictionReport {
    disease_id: String,
    disease_name: String,
    confidence: f32,
    severity: String,
    description: String,
    recommendations: Vec<String>,
    image_url: String,
    substitute_model: bool,
}

#[instrument(skip(state, multipart))]
pub async fn predict_disease(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, PredictRouteError> {
    let upload = read_image_field(&mut multipart).await?;
    let stored = state.uploads.save(&upload.filename, &upload.data).await?;

    let prediction = predict_image(&stored.path, &state.model_provider).await?;
    let substitute_model = state
        .model_provider
        .loaded()
        .map(|h| h.is_substitute())
        .unwrap_or(false);

    let report = match diseases::lookup(&prediction.class_id) {
        Some(info) => PredictionReport {
            disease_id: info.id.to_string(),
            disease_name: info.name.to_string(),
            confidence: prediction.confidence,
            severity: info.severity.to_string(),
            description: info.description.to_string(),
            recommendations: info.recommendations.iter().map(|r| r.to_string()).collect(),
            image_url: format!("/uploads/{}", stored.filename),
            substitute_model,
        },
        None => PredictionReport {
            disease_id: prediction.class_id.clone(),
            disease_name: prediction.class_id,
            confidence: prediction.confidence,
            severity: "unknown".to_string(),
            description: "No information available".to_string(),
            recommendations: vec![
                "Consult an agricultural expert for a full diagnosis".to_string(),
            ],
            image_url: format!("/uploads/{}", stored.filename),
            substitute_model,
        },
    };

    Ok(Json(PredictResponse {
        status: "success",
        message: "Analysis complete",
        data: report,
    }))
}
