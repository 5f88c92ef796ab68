//! Risk Classifier
//!
//! Wrap backend + label map. Fail-open: lỗi ở đây không bao giờ dừng pipeline,
//! chỉ làm label/confidence thành `None`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::inference::{Classifier, InferenceError};
use super::labels::LabelMap;
use crate::logic::features::{FeatureVector, LayoutMismatchError};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("label index {0} not in label map")]
    UnknownLabel(i64),
}

/// Where the confidence value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceState {
    Available,
    /// Model predicted a label but cannot produce probabilities
    Unsupported,
    /// Prediction path failed; label is absent too
    Failed,
}

/// Successful prediction
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label_index: i64,
    pub label: String,
    pub confidence: Option<f64>,
}

/// Classifier output consumed by the risk resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub predicted_label: Option<String>,
    pub confidence: Option<f64>,
    pub state: ConfidenceState,
}

impl ClassificationResult {
    pub fn failed() -> Self {
        Self {
            predicted_label: None,
            confidence: None,
            state: ConfidenceState::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == ConfidenceState::Failed
    }
}

impl From<Prediction> for ClassificationResult {
    fn from(prediction: Prediction) -> Self {
        let state = if prediction.confidence.is_some() {
            ConfidenceState::Available
        } else {
            ConfidenceState::Unsupported
        };
        Self {
            predicted_label: Some(prediction.label),
            confidence: prediction.confidence,
            state,
        }
    }
}

// ============================================================================
// RISK CLASSIFIER
// ============================================================================

/// Backend + label map, both immutable for the process lifetime
pub struct RiskClassifier {
    backend: Box<dyn Classifier>,
    labels: LabelMap,
}

impl RiskClassifier {
    pub fn new(backend: Box<dyn Classifier>, labels: LabelMap) -> Self {
        Self { backend, labels }
    }

    /// Predict, surfacing every failure as a typed error
    pub fn try_classify(&self, features: &FeatureVector) -> Result<Prediction, ClassifyError> {
        features.validate()?;

        let output = self.backend.predict(features)?;

        let label = self
            .labels
            .decode(output.label_index)
            .ok_or(ClassifyError::UnknownLabel(output.label_index))?
            .to_string();

        let confidence = output.probabilities.as_deref().and_then(max_probability);

        Ok(Prediction {
            label_index: output.label_index,
            label,
            confidence,
        })
    }

    /// Fail-open wrapper around `try_classify`
    pub fn classify(&self, features: &FeatureVector) -> ClassificationResult {
        match self.try_classify(features) {
            Ok(prediction) => {
                log::debug!(
                    "Predicted {} (class {}, confidence {:?})",
                    prediction.label,
                    prediction.label_index,
                    prediction.confidence
                );
                prediction.into()
            }
            Err(e) => {
                log::error!("ML prediction failed: {}", e);
                ClassificationResult::failed()
            }
        }
    }
}

/// Highest class probability, ignoring NaN
fn max_probability(probabilities: &[f32]) -> Option<f64> {
    probabilities
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(None, |best: Option<f32>, p| Some(best.map_or(p, |b| b.max(p))))
        .map(f64::from)
}
