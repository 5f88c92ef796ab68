//! Model Module - Pest classification
//!
//! - `inference`: ONNX backend behind the `Classifier` trait
//! - `labels`: class index -> label
//! - `classifier`: fail-open `RiskClassifier`

pub mod inference;
pub mod labels;
pub mod classifier;

// Re-export common types
pub use classifier::{ClassificationResult, ConfidenceState, RiskClassifier};
pub use inference::{Classifier, OnnxClassifier};
pub use labels::LabelMap;
