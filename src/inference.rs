use crate::model::PredictError;
use crate::preprocess::{normalize, PreprocessingError};
use crate::provider::{ModelLoadError, ModelProvider};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Decoded classifier output for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub class_id: String,
    /// Raw winning score, reported verbatim. No softmax is applied, so this
    /// is only probability-like if the model itself outputs probabilities.
    pub confidence: f32,
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("image preprocessing failed: {0}")]
    Preprocessing(#[from] PreprocessingError),
    #[error("model load failed: {0}")]
    ModelLoad(#[from] ModelLoadError),
    #[error("forward pass failed: {0}")]
    Predict(#[from] PredictError),
    #[error("inference task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Runs the full pipeline for one image file: read, normalize, predict,
/// decode. The CPU-heavy decode and forward pass run on the blocking pool so
/// other requests keep making progress; a failed stage surfaces as an
/// `InferenceError` and no partial result is produced.
pub async fn predict_image(
    path: &Path,
    provider: &ModelProvider,
) -> Result<Prediction, InferenceError> {
    let image_data =
        tokio::fs::read(path)
            .await
            .map_err(|source| PreprocessingError::UnreadableFile {
                path: path.to_path_buf(),
                source,
            })?;

    let handle = provider.get().await?;

    let prediction = tokio::task::spawn_blocking(move || {
        let input = normalize(&image_data)?;
        let scores = handle.predict(&input)?;
        Ok::<_, InferenceError>(decode(&scores, handle.labels()))
    })
    .await??;

    tracing::debug!(
        class_id = %prediction.class_id,
        confidence = prediction.confidence,
        "image classified"
    );

    Ok(prediction)
}

/// Argmax decode. Ties break to the lowest index; the winning score is kept
/// as-is.
pub(crate) fn decode(scores: &[f32], labels: &[String]) -> Prediction {
    debug_assert_eq!(scores.len(), labels.len());

    let mut best_index = 0;
    let mut best_score = scores[0];
    for (index, &score) in scores.iter().enumerate().skip(1) {
        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }

    Prediction {
        class_id: labels[best_index].clone(),
        confidence: best_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CLASS_LABELS;
    use crate::provider::ModelSource;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    fn labels() -> Vec<String> {
        CLASS_LABELS.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn decode_picks_highest_score_verbatim() {
        let scores = vec![0.05, 0.40, 0.91, 0.12, 0.33];

        let prediction = decode(&scores, &labels());

        assert_eq!(prediction.class_id, "leaf_mold");
        assert_eq!(prediction.confidence, 0.91);
    }

    #[test]
    fn decode_is_deterministic() {
        let scores = vec![0.1, 0.8, 0.3, 0.2, 0.05];

        let first = decode(&scores, &labels());
        let second = decode(&scores, &labels());

        assert_eq!(first, second);
    }

    #[test]
    fn decode_breaks_ties_to_the_lowest_index() {
        let scores = vec![0.2, 0.9, 0.9, 0.1, 0.0];

        let prediction = decode(&scores, &labels());

        assert_eq!(prediction.class_id, "late_blight");
    }

    #[tokio::test]
    async fn predict_image_runs_the_substitute_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("leaf.png");

        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(64, 48, Rgb([30, 120, 40]));
        let mut png: Vec<u8> = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(&image_path, &png).unwrap();

        let provider = ModelProvider::new(ModelSource::Substitute);
        let prediction = predict_image(&image_path, &provider).await.unwrap();

        assert!(CLASS_LABELS.contains(&prediction.class_id.as_str()));
        assert!((0.70..=0.95).contains(&prediction.confidence));
    }

    #[tokio::test]
    async fn zero_byte_file_is_a_preprocessing_error() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("empty.jpg");
        std::fs::write(&image_path, b"").unwrap();

        let provider = ModelProvider::new(ModelSource::Substitute);
        let result = predict_image(&image_path, &provider).await;

        assert!(matches!(result, Err(InferenceError::Preprocessing(_))));
    }

    #[tokio::test]
    async fn missing_file_is_a_preprocessing_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ModelProvider::new(ModelSource::Substitute);

        let result = predict_image(&dir.path().join("gone.png"), &provider).await;

        assert!(matches!(
            result,
            Err(InferenceError::Preprocessing(
                PreprocessingError::UnreadableFile { .. }
            ))
        ));
    }
}
