use crate::{
    routes::{read_image_field, ErrorBody, ImageFieldError},
    server::SharedState,
    storage::UploadStoreError,
};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum UploadRouteError {
    #[error("{0}")]
    Upload(#[from] ImageFieldError),
    #[error("{0}")]
    Store(#[from] UploadStoreError),
}

impl IntoResponse for UploadRouteError {
    fn into_response(self) -> Response {
        let status = match &self {
            UploadRouteError::Store(UploadStoreError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };

        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    status: &'static str,
    message: &'static str,
    data: UploadedFile,
}

#[derive(Serialize)]
pub struct UploadedFile {
    filename: String,
    originalname: String,
    size: usize,
    url: String,
}

#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadRouteError> {
    let upload = read_image_field(&mut multipart).await?;
    let stored = state.uploads.save(&upload.filename, &upload.data).await?;

    Ok(Json(UploadResponse {
        status: "success",
        message: "File uploaded",
        data: UploadedFile {
            url: format!("/uploads/{}", stored.filename),
            filename: stored.filename,
            originalname: upload.filename,
            size: stored.size,
        },
    }))
}

pub async fn serve_upload(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Response {
    let Some(path) = state.uploads.path_of(&filename) else {
        return not_found();
    };

    match tokio::fs::read(&path).await {
        Ok(data) => (
            [(header::CONTENT_TYPE, content_type_for(&filename))],
            data,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => not_found(),
        Err(e) => {
            tracing::error!(error = %e, filename = %filename, "failed to read upload");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("failed to read image")),
            )
                .into_response()
        }
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new("image not found")),
    )
        .into_response()
}

fn content_type_for(filename: &str) -> &'static str {
    match std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}
