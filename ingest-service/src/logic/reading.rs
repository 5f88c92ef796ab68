//! Reading - one decoded sensor sample from the field node
//!
//! Mọi field đều optional: node firmware cũ không gửi `light`, node mới
//! gửi `gas` thay cho `mq135`. Thiếu field là hợp lệ.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ============================================================================
// READING
// ============================================================================

/// Structured sensor reading, keyed by the wire names the node firmware emits
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Reading {
    #[serde(default, rename = "temp", deserialize_with = "lenient_f64")]
    pub temperature: Option<f64>,

    #[serde(default, rename = "hum", deserialize_with = "lenient_f64")]
    pub humidity: Option<f64>,

    #[serde(default, rename = "soil", deserialize_with = "lenient_f64")]
    pub soil_moisture: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub light: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub gas: Option<f64>,

    /// Legacy gas sensor key (MQ-135 boards)
    #[serde(default, rename = "mq135", deserialize_with = "lenient_f64")]
    pub gas_alias: Option<f64>,

    /// Node / crop identifier. Kept as raw JSON: only strings take part in crop encoding.
    #[serde(default)]
    pub node: Option<Value>,

    #[serde(default)]
    pub crop: Option<Value>,

    /// Rule-based risk computed on the node (legacy, secondary)
    #[serde(default, rename = "risk", deserialize_with = "lenient_f64")]
    pub rule_risk: Option<f64>,

    #[serde(default, rename = "timestamp_ms", deserialize_with = "lenient_i64")]
    pub capture_time_ms: Option<i64>,
}

// ============================================================================
// LENIENT NUMERIC DECODING
// ============================================================================

/// Coerce a JSON scalar into a number.
///
/// Accepts numbers, booleans (1/0) and numeric strings; `null` means absent.
/// Arrays, objects and non-numeric strings are rejected.
pub fn numeric_value(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("number out of range: {}", n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("not a number: {:?}", s)),
        Value::Array(_) => Err("expected number, got array".to_string()),
        Value::Object(_) => Err("expected number, got object".to_string()),
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    numeric_value(&value).map_err(serde::de::Error::custom)
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(i) = value.as_i64() {
        return Ok(Some(i));
    }
    let number = numeric_value(&value).map_err(serde::de::Error::custom)?;
    match number {
        Some(n) if n.is_finite() => Ok(Some(n.trunc() as i64)),
        Some(n) => Err(serde::de::Error::custom(format!("invalid timestamp: {}", n))),
        None => Ok(None),
    }
}

/// Python-style truthiness for categorical fields
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_reading() {
        let reading: Reading = serde_json::from_value(json!({
            "node": "Tomato", "temp": 24.5, "hum": 60, "soil": 33,
            "light": 812, "gas": 120, "risk": 0.4, "timestamp_ms": 1700000000123i64
        }))
        .unwrap();

        assert_eq!(reading.temperature, Some(24.5));
        assert_eq!(reading.humidity, Some(60.0));
        assert_eq!(reading.gas, Some(120.0));
        assert_eq!(reading.gas_alias, None);
        assert_eq!(reading.rule_risk, Some(0.4));
        assert_eq!(reading.capture_time_ms, Some(1_700_000_000_123));
        assert_eq!(reading.node, Some(json!("Tomato")));
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let reading: Reading = serde_json::from_str("{}").unwrap();
        assert_eq!(reading, Reading::default());
    }

    #[test]
    fn test_null_is_absent() {
        let reading: Reading = serde_json::from_str(r#"{"temp": null, "node": null}"#).unwrap();
        assert_eq!(reading.temperature, None);
        assert_eq!(reading.node, None);
    }

    #[test]
    fn test_numeric_strings_and_bools() {
        let reading: Reading =
            serde_json::from_str(r#"{"temp": " 21.5 ", "hum": true, "timestamp_ms": "42"}"#).unwrap();
        assert_eq!(reading.temperature, Some(21.5));
        assert_eq!(reading.humidity, Some(1.0));
        assert_eq!(reading.capture_time_ms, Some(42));
    }

    #[test]
    fn test_float_timestamp_truncates() {
        let reading: Reading = serde_json::from_str(r#"{"timestamp_ms": 1500.9}"#).unwrap();
        assert_eq!(reading.capture_time_ms, Some(1500));
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        assert!(serde_json::from_str::<Reading>(r#"{"temp": "hot"}"#).is_err());
        assert!(serde_json::from_str::<Reading>(r#"{"gas": [1, 2]}"#).is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let reading: Reading = serde_json::from_str(r#"{"rssi": -71, "temp": 20}"#).unwrap();
        assert_eq!(reading.temperature, Some(20.0));
    }

    #[test]
    fn test_is_falsy() {
        assert!(is_falsy(&json!(null)));
        assert!(is_falsy(&json!("")));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!(false)));
        assert!(!is_falsy(&json!("Carrot")));
        assert!(!is_falsy(&json!(3)));
    }
}
