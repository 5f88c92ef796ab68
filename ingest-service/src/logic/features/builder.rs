//! Feature Builder
//!
//! `Reading` -> `FeatureVector`. Pure function, không có state.
//!
//! Numeric features dùng `feature_value_or_zero`: absent và 0 là như nhau
//! (model được train như vậy). Đừng dùng chung với `document::stored_value`.

use serde_json::Value;

use super::vector::FeatureVector;
use crate::logic::reading::{is_falsy, Reading};

/// The one crop the model distinguishes (compared trimmed + lower-cased)
pub const DISTINGUISHED_CROP: &str = "tomato";

/// Build the model input vector: `[gas, temp, hum, soil, crop_encoded]`
pub fn build(reading: &Reading) -> FeatureVector {
    FeatureVector::from_values([
        feature_value_or_zero(reading.gas, reading.gas_alias),
        feature_value_or_zero(reading.temperature, None),
        feature_value_or_zero(reading.humidity, None),
        feature_value_or_zero(reading.soil_moisture, None),
        encode_crop(crop_field(reading)),
    ])
}

/// Primary, then alias, then 0.0. Zero counts as missing.
pub fn feature_value_or_zero(primary: Option<f64>, alias: Option<f64>) -> f32 {
    [primary, alias]
        .into_iter()
        .flatten()
        .find(|v| *v != 0.0)
        .unwrap_or(0.0) as f32
}

/// `node`, or `crop` when `node` is falsy
fn crop_field(reading: &Reading) -> Option<&Value> {
    reading
        .node
        .as_ref()
        .filter(|v| !is_falsy(v))
        .or(reading.crop.as_ref())
}

/// Binary crop encoding: tomato -> 1, anything else (incl. non-strings) -> 0
pub fn encode_crop(value: Option<&Value>) -> f32 {
    match value {
        Some(Value::String(name)) if name.trim().to_lowercase() == DISTINGUISHED_CROP => 1.0,
        _ => 0.0,
    }
}
