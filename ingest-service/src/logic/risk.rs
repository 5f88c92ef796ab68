//! Risk Resolver
//!
//! ClassificationResult -> authoritative `ml_risk`.
//! Rule risk từ node KHÔNG BAO GIỜ được dùng ở đây.

use serde::{Deserialize, Serialize};

use super::model::ClassificationResult;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Label meaning "no pest pressure"
pub const NO_RISK_LABEL: &str = "No Pest";

/// Risk reported for the no-risk label. Zero is reserved for "no data".
pub const NO_RISK_FLOOR: f64 = 0.05;

// ============================================================================
// POLICY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub no_risk_label: String,
    pub no_risk_floor: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            no_risk_label: NO_RISK_LABEL.to_string(),
            no_risk_floor: NO_RISK_FLOOR,
        }
    }
}

impl RiskPolicy {
    /// No-risk label -> floor; else confidence; else absent
    pub fn resolve(&self, result: &ClassificationResult) -> Option<f64> {
        if result.predicted_label.as_deref() == Some(self.no_risk_label.as_str()) {
            return Some(self.no_risk_floor);
        }
        result.confidence
    }
}
