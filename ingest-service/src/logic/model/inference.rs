//! Inference Engine - ONNX Runtime Integration
//!
//! Load và chạy pest model (exported to ONNX).
//! Trait `Classifier` tách backend khỏi `RiskClassifier` để dễ swap / test.

use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::{DynValue, Value};

use crate::logic::features::layout::layout_hash;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model not found: {0}")]
    NotFound(String),
    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to load model: {0}")]
    Load(String),
    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("tensor error: {0}")]
    Tensor(String),
    #[error("inference failed: {0}")]
    Run(String),
    #[error("model produced no label")]
    NoLabel,
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Raw backend output, before label decoding
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub label_index: i64,
    /// Class-membership probabilities, `None` if the model cannot produce them
    pub probabilities: Option<Vec<f32>>,
}

/// Model metadata, logged at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub sha256: String,
    pub outputs: Vec<String>,
    pub features: usize,
    pub layout_hash: u32,
    pub loaded_at: DateTime<Utc>,
}

impl ModelMetadata {
    /// Compare against an operator-supplied SHA-256 (hex, case-insensitive)
    pub fn verify_checksum(&self, expected: &str) -> Result<(), InferenceError> {
        let expected = expected.trim().to_lowercase();
        if self.sha256 == expected {
            Ok(())
        } else {
            Err(InferenceError::ChecksumMismatch {
                expected,
                actual: self.sha256.clone(),
            })
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Backend seam: ONNX in production, stubs in tests
pub trait Classifier: Send {
    fn predict(&self, features: &FeatureVector) -> Result<ModelOutput, InferenceError>;
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// Classifier backed by an ONNX Runtime session.
///
/// Output 0 is the predicted label; output 1 (if any) the probability row.
pub struct OnnxClassifier {
    // Session::run needs &mut
    session: Mutex<Session>,
    label_output: String,
    probability_output: Option<String>,
    metadata: ModelMetadata,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(InferenceError::NotFound(model_path.display().to_string()));
        }

        let model_bytes = std::fs::read(model_path)?;

        let session = Session::builder()
            .map_err(|e| InferenceError::Load(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Load(format!("Failed to set optimization: {}", e)))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| InferenceError::Load(format!("Failed to load model: {}", e)))?;

        let outputs: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let label_output = outputs
            .first()
            .cloned()
            .ok_or_else(|| InferenceError::Load("No output defined".to_string()))?;
        let probability_output = outputs.get(1).cloned();

        if probability_output.is_none() {
            log::warn!("Model has a single output - confidence will be unavailable");
        }

        let metadata = ModelMetadata {
            model_path: model_path.display().to_string(),
            sha256: sha256_hex(&model_bytes),
            outputs,
            features: FEATURE_COUNT,
            layout_hash: layout_hash(),
            loaded_at: Utc::now(),
        };

        log::info!("ONNX model loaded successfully (sha256: {})", metadata.sha256);

        Ok(Self {
            session: Mutex::new(session),
            label_output,
            probability_output,
            metadata,
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<ModelOutput, InferenceError> {
        let input_array = Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), features.as_slice().to_vec())
            .map_err(|e| InferenceError::Tensor(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError::Tensor(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Run(e.to_string()))?;

        let label = outputs
            .get(self.label_output.as_str())
            .ok_or(InferenceError::NoLabel)?;
        let label_index = extract_label(label)?;

        let probabilities = extract_probabilities(
            self.probability_output
                .as_ref()
                .and_then(|name| outputs.get(name.as_str())),
        );

        Ok(ModelOutput {
            label_index,
            probabilities,
        })
    }
}

/// Label tensor is int64 for sklearn exports, float for some converters
fn extract_label(value: &DynValue) -> Result<i64, InferenceError> {
    if let Ok((_, data)) = value.try_extract_tensor::<i64>() {
        return first_label(data);
    }

    let (_, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|e| InferenceError::Tensor(format!("Extract error: {}", e)))?;

    first_float_label(data)
}

fn first_label(data: &[i64]) -> Result<i64, InferenceError> {
    data.first().copied().ok_or(InferenceError::NoLabel)
}

fn first_float_label(data: &[f32]) -> Result<i64, InferenceError> {
    data.first()
        .map(|v| v.round() as i64)
        .ok_or(InferenceError::NoLabel)
}

/// Probability row, or `None` when the output is missing or not an f32 tensor
/// (zipmap-style sequence of maps, int outputs)
fn extract_probabilities(value: Option<&DynValue>) -> Option<Vec<f32>> {
    match value?.try_extract_tensor::<f32>() {
        Ok((_, data)) => Some(data.to_vec()),
        Err(e) => {
            log::debug!("Probabilities unavailable: {}", e);
            None
        }
    }
}
