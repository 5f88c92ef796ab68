//! Feature Vector
//!
//! Model input + the layout stamp it was built with. The classifier checks
//! the stamp before running the session.

use std::collections::BTreeMap;

use serde::Serialize;

use super::layout::{LayoutMismatchError, LayoutStamp, FEATURE_COUNT, FEATURE_LAYOUT};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub stamp: LayoutStamp,
    /// Ordered as `FEATURE_LAYOUT`
    pub values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self {
            stamp: LayoutStamp::current(),
            values,
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        self.stamp.check()
    }

    /// `{"layout": "v1 (..)", "values": {"mq135": .., ...}}` for debug logs
    pub fn to_log_entry(&self) -> serde_json::Value {
        let named: BTreeMap<&str, f32> = FEATURE_LAYOUT.iter().copied().zip(self.values).collect();
        serde_json::json!({
            "layout": self.stamp.to_string(),
            "values": named,
        })
    }
}

impl From<[f32; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f32; FEATURE_COUNT]) -> Self {
        Self::from_values(values)
    }
}
