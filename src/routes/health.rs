use crate::model::ModelKind;
use crate::server::SharedState;
use axum::{extract::State, response::IntoResponse, response::Json};
use serde::Serialize;

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ModelStatus {
    NotLoaded,
    Trained,
    Substitute,
}

#[derive(Serialize)]
pub struct Status {
    status: String,
    model: ModelStatus,
}

fn model_status(state: &SharedState) -> ModelStatus {
    match state.model_provider.loaded().map(|h| h.kind()) {
        None => ModelStatus::NotLoaded,
        Some(ModelKind::Trained) => ModelStatus::Trained,
        Some(ModelKind::Substitute) => ModelStatus::Substitute,
    }
}

pub async fn healthcheck(State(state): State<SharedState>) -> impl IntoResponse {
    Json(Status {
        status: "Available".into(),
        model: model_status(&state),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::UploadConfig,
        provider::{ModelProvider, ModelSource},
        storage::UploadStore,
    };
    use std::sync::Arc;

    async fn state_with(provider: ModelProvider, dir: &std::path::Path) -> SharedState {
        let config = UploadConfig {
            upload_dir: dir.to_path_buf(),
            max_upload_mb: 1,
        };
        SharedState {
            model_provider: Arc::new(provider),
            uploads: Arc::new(UploadStore::new(&config).await.unwrap()),
        }
    }

    #[tokio::test]
    async fn model_status_tracks_the_provider() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(ModelProvider::new(ModelSource::Substitute), dir.path()).await;

        assert_eq!(model_status(&state), ModelStatus::NotLoaded);

        state.model_provider.get().await.unwrap();
        assert_eq!(model_status(&state), ModelStatus::Substitute);
    }
}
