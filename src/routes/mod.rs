mod diseases;
mod health;
mod predict;
mod uploads;

use crate::server::SharedState;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use thiserror::Error;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health::healthcheck))
        .route("/api/predict", post(predict::predict_disease))
        .route("/api/upload", post(uploads::upload_image))
        .route("/api/diseases", get(diseases::list_diseases))
        .route("/api/diseases/{id}", get(diseases::get_disease))
        .route("/uploads/{filename}", get(uploads::serve_upload))
}

/// Error body every route returns on failure.
#[derive(Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

pub(crate) struct ImageUpload {
    pub filename: String,
    pub data: axum::body::Bytes,
}

#[derive(Debug, Error)]
pub(crate) enum ImageFieldError {
    #[error("failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("no image file was uploaded")]
    Missing,
    #[error("uploaded file must be an image, got {0}")]
    NotAnImage(String),
}

/// Pulls the `image` field out of a multipart upload and checks its MIME
/// type. Other fields are ignored.
pub(crate) async fn read_image_field(
    multipart: &mut Multipart,
) -> Result<ImageUpload, ImageFieldError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(ImageFieldError::NotAnImage(content_type));
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await?;

        return Ok(ImageUpload { filename, data });
    }

    Err(ImageFieldError::Missing)
}
