//! Persisted Document
//!
//! Record ghi xuống store. `ml_risk` là field chính; `rule_risk` chỉ giữ
//! cho dashboard cũ, không bao giờ ghi đè `ml_risk`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub node: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub light: Option<f64>,
    pub gas: Option<f64>,

    /// Legacy rule-based risk from the node (secondary)
    pub rule_risk: Option<f64>,

    pub ml_predicted_label: Option<String>,
    pub ml_confidence: Option<f64>,
    /// Authoritative risk (primary)
    pub ml_risk: Option<f64>,

    /// Server receive time, float seconds since epoch
    pub server_time: f64,
    pub capture_time_ms: i64,
}

/// Document plus the store-assigned id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    #[serde(flatten)]
    pub document: PersistedDocument,
}

// ============================================================================
// PERSISTENCE CONVERSIONS
// ============================================================================

/// Persistence coercion: present -> float, absent -> `None`. Never defaults to 0.
///
/// Non-finite values have no SQL REAL representation and are stored as unknown.
pub fn stored_value(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Node id as stored: strings verbatim, other scalars as JSON text
pub fn stored_node(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
