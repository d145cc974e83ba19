use crate::config::UploadConfig;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadStoreError {
    #[error("upload of {got} bytes exceeds the {limit} byte limit")]
    TooLarge { got: usize, limit: usize },
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

/// Owns the upload directory: naming, persistence and lookup of uploaded
/// images. The inference core only ever sees the resulting file path.
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub async fn new(config: &UploadConfig) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(&config.upload_dir).await?;
        Ok(Self {
            dir: config.upload_dir.clone(),
            max_bytes: config.max_bytes(),
        })
    }

    pub async fn save(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredImage, UploadStoreError> {
        if data.len() > self.max_bytes {
            return Err(UploadStoreError::TooLarge {
                got: data.len(),
                limit: self.max_bytes,
            });
        }

        let filename = unique_filename(original_name);
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, data).await?;

        tracing::debug!(filename = %filename, size = data.len(), "stored upload");

        Ok(StoredImage {
            filename,
            path,
            size: data.len(),
        })
    }

    /// Resolves a stored filename back to its path. Rejects anything that
    /// would escape the upload directory.
    pub fn path_of(&self, filename: &str) -> Option<PathBuf> {
        let candidate = Path::new(filename);
        if candidate.components().count() != 1 || filename.starts_with('.') {
            return None;
        }
        Some(self.dir.join(candidate))
    }
}

fn unique_filename(original_name: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);

    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    format!("image-{timestamp}-{suffix}{extension}")
}
