//! Line Decoder
//!
//! Raw serial line -> `Reading`. Không bao giờ panic: mọi line hỏng đều
//! trở thành `DecodeSkip` và bị bỏ qua, line sau không bị ảnh hưởng.

use thiserror::Error;

use super::reading::Reading;
use crate::constants::LINE_PREFIX;

/// Why a transport line did not produce a reading
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeSkip {
    /// Blank line (keep-alive, CRLF noise)
    #[error("empty line")]
    Empty,
    /// Boot banner, debug print, anything that is not a JSON object
    #[error("not a JSON object")]
    NotAnObject,
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Decode one transport line
pub fn decode(raw: &str) -> Result<Reading, DecodeSkip> {
    let line = raw.trim();
    if line.is_empty() {
        return Err(DecodeSkip::Empty);
    }

    let payload = match line.strip_prefix(LINE_PREFIX) {
        Some(rest) => rest.trim(),
        None => line,
    };

    if !payload.starts_with('{') {
        return Err(DecodeSkip::NotAnObject);
    }

    // qua Value trước: key lặp lại thì value cuối thắng
    let object: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| DecodeSkip::Malformed(e.to_string()))?;
    serde_json::from_value::<Reading>(object).map_err(|e| DecodeSkip::Malformed(e.to_string()))
}

pub(crate) fn log_skip(raw: &str, skip: &DecodeSkip) {
    match skip {
        DecodeSkip::Empty => {}
        DecodeSkip::NotAnObject => log::debug!("Ignoring non-JSON line: {:?}", raw.trim()),
        DecodeSkip::Malformed(reason) => log::warn!("JSON parse failed: {}", reason),
    }
}
