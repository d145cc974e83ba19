use ndarray::{Array, Ix4};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use rand::Rng;
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Disease classes in the classifier's output index order.
pub const CLASS_LABELS: [&str; 5] = [
    "early_blight",
    "late_blight",
    "leaf_mold",
    "septoria_leaf_spot",
    "healthy",
];

/// Whether a handle runs a trained artifact or synthetic stand-in scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Trained,
    Substitute,
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("model session lock poisoned")]
    PoisonedSession,
    #[error("forward pass failed: {0}")]
    Session(#[from] ort::Error),
    #[error("model produced {got} scores for {expected} labels")]
    LabelMismatch { expected: usize, got: usize },
}

pub trait Classifier: Send + Sync {
    fn predict(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, PredictError>;
}

/// A loaded classifier plus the label list matching its output index space.
///
/// Built once per process, then shared read-only by every request.
pub struct ModelHandle {
    classifier: Box<dyn Classifier>,
    labels: Vec<String>,
    kind: ModelKind,
}

impl ModelHandle {
    pub fn trained(classifier: OrtClassifier) -> Self {
        Self::new(Box::new(classifier), ModelKind::Trained)
    }

    pub fn substitute() -> Self {
        let classifier = SubstituteClassifier {
            num_classes: CLASS_LABELS.len(),
        };
        Self::new(Box::new(classifier), ModelKind::Substitute)
    }

    fn new(classifier: Box<dyn Classifier>, kind: ModelKind) -> Self {
        Self {
            classifier,
            labels: CLASS_LABELS.iter().map(|l| l.to_string()).collect(),
            kind,
        }
    }

    /// Runs the forward pass and enforces the score-per-label invariant.
    pub fn predict(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, PredictError> {
        let scores = self.classifier.predict(input)?;
        if scores.len() != self.labels.len() {
            return Err(PredictError::LabelMismatch {
                expected: self.labels.len(),
                got: scores.len(),
            });
        }
        Ok(scores)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn is_substitute(&self) -> bool {
        self.kind == ModelKind::Substitute
    }
}

pub struct OrtClassifier {
    session: Mutex<Session>,
    output_name: String,
}

impl OrtClassifier {
    pub fn from_file(path: &Path) -> Result<Self, ort::Error> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)?;

        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .unwrap_or_else(|| "output0".to_string());

        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl Classifier for OrtClassifier {
    fn predict(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, PredictError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| PredictError::PoisonedSession)?;

        let tensor_ref = TensorRef::from_array_view(input.view())?;
        let input_tensor = ort::inputs![tensor_ref];

        let outputs = session.run(input_tensor)?;
        let (_shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        Ok(data.to_vec())
    }
}

/// Stand-in prediction source for environments without a trained artifact.
///
/// One uniformly random label wins with a score in `[0.70, 0.95]`; every
/// other label gets an independent score in `[0, 0.20]`.
pub struct SubstituteClassifier {
    num_classes: usize,
}

impl Classifier for SubstituteClassifier {
    fn predict(&self, _input: &Array<f32, Ix4>) -> Result<Vec<f32>, PredictError> {
        let mut rng = rand::rng();
        let winner = rng.random_range(0..self.num_classes);

        let scores = (0..self.num_classes)
            .map(|i| {
                if i == winner {
                    rng.random_range(0.70..=0.95)
                } else {
                    rng.random_range(0.0..0.20)
                }
            })
            .collect();

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn zero_input() -> Array<f32, Ix4> {
        Array::zeros((1, 224, 224, 3))
    }

    #[test]
    fn substitute_scores_stay_in_contract_ranges() {
        let handle = ModelHandle::substitute();

        for _ in 0..50 {
            let scores = handle.predict(&zero_input()).unwrap();
            assert_eq!(scores.len(), CLASS_LABELS.len());

            let max = scores.iter().cloned().fold(f32::MIN, f32::max);
            assert!((0.70..=0.95).contains(&max), "winning score {max}");

            for &score in scores.iter().filter(|&&s| s < max) {
                assert!((0.0..0.20).contains(&score), "loser score {score}");
            }
        }
    }

    #[test]
    fn substitute_winner_varies_across_calls() {
        let handle = ModelHandle::substitute();

        let mut winners = std::collections::HashSet::new();
        for _ in 0..100 {
            let scores = handle.predict(&zero_input()).unwrap();
            let winner = scores
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap();
            winners.insert(winner);
        }

        // 100 draws over 5 classes landing on a single class would mean a
        // fixed bias in the stand-in.
        assert!(winners.len() > 1);
    }

    #[test]
    fn handle_rejects_score_label_mismatch() {
        struct TruncatedClassifier;

        impl Classifier for TruncatedClassifier {
            fn predict(&self, _input: &Array<f32, Ix4>) -> Result<Vec<f32>, PredictError> {
                Ok(vec![0.1, 0.2, 0.3])
            }
        }

        let handle = ModelHandle::new(Box::new(TruncatedClassifier), ModelKind::Trained);
        let result = handle.predict(&zero_input());

        assert!(matches!(
            result,
            Err(PredictError::LabelMismatch {
                expected: 5,
                got: 3
            })
        ));
    }

    #[test]
    fn substitute_handle_reports_its_kind() {
        let handle = ModelHandle::substitute();
        assert!(handle.is_substitute());
        assert_eq!(handle.kind(), ModelKind::Substitute);
    }
}
