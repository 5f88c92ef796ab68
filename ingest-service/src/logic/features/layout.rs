//! Feature Layout
//!
//! Thứ tự cột của pest model lúc train (DataFrame `[mq135, temp, hum, soil, crop_encoded]`).
//! Đổi thứ tự hoặc thêm cột: tăng `FEATURE_VERSION` và train lại model.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub const FEATURE_VERSION: u8 = 1;

pub const FEATURE_COUNT: usize = 5;

/// Training-time column names, in vector order
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    "mq135",        // gas reading, `gas` key first, legacy `mq135` second
    "temp",         // °C
    "hum",          // %
    "soil",         // %
    "crop_encoded", // 1 = tomato
];

/// CRC32 over version + column names
pub fn layout_hash() -> u32 {
    let mut key = vec![FEATURE_VERSION];
    for name in FEATURE_LAYOUT {
        key.extend_from_slice(name.as_bytes());
        key.push(b'\n');
    }
    crc32fast::hash(&key)
}

/// One-line layout description for the startup log
pub fn describe() -> String {
    format!("{} [{}]", LayoutStamp::current(), FEATURE_LAYOUT.join(", "))
}

// ============================================================================
// LAYOUT STAMP
// ============================================================================

/// Layout a vector was built against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutStamp {
    pub version: u8,
    pub hash: u32,
}

impl LayoutStamp {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
        }
    }

    /// Err if this stamp is not the layout the model was trained on
    pub fn check(self) -> Result<(), LayoutMismatchError> {
        let expected = Self::current();
        if self == expected {
            Ok(())
        } else {
            Err(LayoutMismatchError {
                expected,
                found: self,
            })
        }
    }
}

impl fmt::Display for LayoutStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{} ({:08x})", self.version, self.hash)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("feature layout mismatch: model expects {expected}, vector has {found}")]
pub struct LayoutMismatchError {
    pub expected: LayoutStamp,
    pub found: LayoutStamp,
}
