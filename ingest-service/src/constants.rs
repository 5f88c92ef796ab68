//! Central Configuration Constants
//!
//! Single source of truth for all ingestion defaults.
//! CLI flags and env vars override these; see `config.rs`.

use std::path::PathBuf;

/// Default serial baud rate of the field node firmware
pub const DEFAULT_BAUD: u32 = 115_200;

/// Serial read timeout (seconds). A timeout with no data is a no-op tick.
pub const SERIAL_TIMEOUT_SECS: u64 = 1;

/// Logging tag the receiver firmware prepends to forwarded LoRa payloads
pub const LINE_PREFIX: &str = "Received:";

/// Default ONNX model artifact
pub const DEFAULT_MODEL_PATH: &str = "model/pest_rf_model.onnx";

/// Default label-index mapping artifact
pub const DEFAULT_LABELS_PATH: &str = "model/label_encoder.json";

/// SQLite file name inside the data directory
pub const DB_FILE_NAME: &str = "farm_iot.db";

/// Collection (table) holding enriched readings
pub const COLLECTION_NAME: &str = "sensor_readings";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Farm IoT Ingest";

// ============================================
// Helper functions
// ============================================

/// Default database location: `<data_local_dir>/farm-iot/farm_iot.db`
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("farm-iot")
        .join(DB_FILE_NAME)
}
