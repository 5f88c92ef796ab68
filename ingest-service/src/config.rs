//! Command-line configuration

use std::path::PathBuf;

use clap::Parser;

use crate::constants::{default_db_path, DEFAULT_BAUD, DEFAULT_LABELS_PATH, DEFAULT_MODEL_PATH};

/// Serial ingestion and pest-risk enrichment for farm sensor nodes
#[derive(Debug, Clone, Parser)]
#[command(name = "farm-iot-ingest", version, about)]
pub struct Args {
    /// Serial port of the LoRa receiver (e.g. /dev/ttyUSB0, COM3)
    #[arg(long, env = "FARM_IOT_PORT")]
    pub port: String,

    /// Serial baud rate
    #[arg(long, env = "FARM_IOT_BAUD", default_value_t = DEFAULT_BAUD)]
    pub baud: u32,

    /// SQLite database file [default: <data dir>/farm-iot/farm_iot.db]
    #[arg(long, env = "FARM_IOT_DB")]
    pub db: Option<PathBuf>,

    /// ONNX pest classifier
    #[arg(long, env = "FARM_IOT_MODEL", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Class index -> label mapping (JSON)
    #[arg(long, env = "FARM_IOT_LABELS", default_value = DEFAULT_LABELS_PATH)]
    pub labels: PathBuf,

    /// Expected SHA-256 of the model file; startup fails on mismatch
    #[arg(long, env = "FARM_IOT_MODEL_SHA256")]
    pub model_sha256: Option<String>,
}

impl Args {
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(default_db_path)
    }
}
