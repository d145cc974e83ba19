use crate::model::{ModelHandle, OrtClassifier, PredictError};
use crate::preprocess::INPUT_SIZE;
use ndarray::Array;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Where predictions come from. An explicit configuration choice so that
/// operators can tell real inference apart from stand-in behavior.
#[derive(Debug, Clone)]
pub enum ModelSource {
    Trained(PathBuf),
    Substitute,
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to look up model artifact {path}: {source}")]
    ArtifactLookup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to deserialize model artifact {path}: {source}")]
    Deserialize { path: PathBuf, source: ort::Error },
    #[error("model warm-up inference failed: {0}")]
    WarmUp(PredictError),
    #[error("model load task aborted: {0}")]
    Load(#[from] tokio::task::JoinError),
}

/// Lazily loads the model once per process and hands out the cached handle.
///
/// The `OnceCell` is the single-flight guard: concurrent first-callers all
/// await the same in-flight load instead of each deserializing the artifact.
/// A failed load is not cached, so a later call may retry.
pub struct ModelProvider {
    source: ModelSource,
    handle: OnceCell<Arc<ModelHandle>>,
}

impl ModelProvider {
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            handle: OnceCell::new(),
        }
    }

    /// Returns the cached handle, loading it on the first call.
    ///
    /// A `Trained` source whose artifact is missing falls back to a
    /// substitute handle with a warning; only unexpected I/O or a corrupt
    /// artifact is an error.
    pub async fn get(&self) -> Result<Arc<ModelHandle>, ModelLoadError> {
        self.handle
            .get_or_try_init(|| self.load())
            .await
            .map(Arc::clone)
    }

    /// Handle kind if a load already completed; `None` before the first load.
    pub fn loaded(&self) -> Option<&Arc<ModelHandle>> {
        self.handle.get()
    }

    async fn load(&self) -> Result<Arc<ModelHandle>, ModelLoadError> {
        let handle = match &self.source {
            ModelSource::Substitute => {
                tracing::info!("serving substitute model by configuration");
                ModelHandle::substitute()
            }
            ModelSource::Trained(path) => match tokio::fs::metadata(path).await {
                Ok(_) => {
                    let path = path.clone();
                    tokio::task::spawn_blocking(move || load_trained(&path)).await??
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::warn!(
                        path = %path.display(),
                        "model artifact not found, serving substitute predictions"
                    );
                    ModelHandle::substitute()
                }
                Err(source) => {
                    return Err(ModelLoadError::ArtifactLookup {
                        path: path.clone(),
                        source,
                    })
                }
            },
        };

        Ok(Arc::new(handle))
    }
}

fn load_trained(path: &Path) -> Result<ModelHandle, ModelLoadError> {
    tracing::info!(path = %path.display(), "loading model artifact");

    let classifier = OrtClassifier::from_file(path).map_err(|source| {
        ModelLoadError::Deserialize {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let handle = ModelHandle::trained(classifier);

    // One throwaway inference so deferred graph compilation happens here
    // instead of during the first real request.
    let size = INPUT_SIZE as usize;
    let warm_up = Array::zeros((1, size, size, 3));
    handle.predict(&warm_up).map_err(ModelLoadError::WarmUp)?;

    tracing::info!("model loaded and warmed up");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_artifact_falls_back_to_substitute() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ModelProvider::new(ModelSource::Trained(dir.path().join("no_model.onnx")));

        let handle = provider.get().await.unwrap();

        assert!(handle.is_substitute());
    }

    #[tokio::test]
    async fn lookup_error_other_than_not_found_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"plain file").unwrap();

        // Path through a regular file errors with NotADirectory, not NotFound.
        let provider = ModelProvider::new(ModelSource::Trained(blocker.join("model.onnx")));
        let result = provider.get().await;

        assert!(matches!(
            result,
            Err(ModelLoadError::ArtifactLookup { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_handle() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ModelProvider::new(ModelSource::Trained(
            dir.path().join("no_model.onnx"),
        )));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let provider = Arc::clone(&provider);
                tokio::spawn(async move { provider.get().await.unwrap() })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        let first = &handles[0];
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, first)));
    }

    #[tokio::test]
    async fn substitute_source_never_touches_the_filesystem() {
        let provider = ModelProvider::new(ModelSource::Substitute);

        let handle = provider.get().await.unwrap();

        assert!(handle.is_substitute());
        assert!(provider.loaded().is_some());
    }
}
