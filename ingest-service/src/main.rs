//! Farm IoT Ingest - Main Entry Point
//!
//! Serial line -> decode -> ML enrich -> SQLite, một line một lần.
//! Ctrl+C dừng loop sau line hiện tại.

mod config;
mod logic;
pub mod constants;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;

use config::Args;
use logic::features::layout;
use logic::model::inference::InferenceError;
use logic::model::labels::LabelMapError;
use logic::model::{LabelMap, OnnxClassifier, RiskClassifier};
use logic::pipeline::EnrichmentPipeline;
use logic::store::{ReadingStore, SqliteReadingStore, StoreError};
use logic::transport::{self, TransportError};

/// Fatal errors before the first line is read
#[derive(Debug, Error)]
enum StartupError {
    #[error("cannot open store {}: {source}", .path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Labels(#[from] LabelMapError),
    #[error(transparent)]
    Model(#[from] InferenceError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    log::info!("Starting {} v{}...", constants::APP_NAME, constants::APP_VERSION);

    // ========== Store ==========
    let db_path = args.db_path();
    let store = SqliteReadingStore::open(&db_path).map_err(|source| StartupError::Store {
        path: db_path.clone(),
        source,
    })?;
    log::info!("Store ready: {} ({})", db_path.display(), constants::COLLECTION_NAME);

    match store.latest(1) {
        Ok(last) => match last.first() {
            Some(doc) => log::info!("Last stored reading captured at {} ms", doc.document.capture_time_ms),
            None => log::info!("Store is empty"),
        },
        Err(e) => log::warn!("Could not read last reading: {}", e),
    }

    // ========== Model ==========
    let labels = LabelMap::load(&args.labels).map_err(StartupError::from)?;
    let backend = OnnxClassifier::load(&args.model).map_err(StartupError::from)?;

    if let Some(expected) = &args.model_sha256 {
        backend.metadata().verify_checksum(expected).map_err(StartupError::from)?;
        log::info!("Model checksum verified");
    }

    let metadata = backend.metadata();
    log::info!("Feature layout: {}", layout::describe());
    log::info!(
        "Model loaded: {} (sha256: {}, outputs: [{}])",
        metadata.model_path,
        metadata.sha256,
        metadata.outputs.join(", ")
    );

    let classifier = RiskClassifier::new(Box::new(backend), labels);
    let pipeline = EnrichmentPipeline::new(classifier, store);

    // ========== Transport ==========
    let mut source = transport::open_serial(&args.port, args.baud).map_err(StartupError::from)?;

    let stop = Arc::new(AtomicBool::new(false));
    spawn_ctrl_c_handler(stop.clone());
    log::info!("Press Ctrl+C to stop");

    let stats = logic::ingest_loop::run(&mut source, &pipeline, &stop)?;
    log::info!("Session summary: {}", stats);

    Ok(())
}

/// Set `stop` on Ctrl+C. The loop sees it after the current read (<= 1s).
fn spawn_ctrl_c_handler(stop: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                log::warn!("Ctrl+C handler unavailable: {}", e);
                return;
            }
        };

        runtime.block_on(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    log::info!("Ctrl+C received, stopping...");
                    stop.store(true, Ordering::SeqCst);
                }
                Err(e) => log::warn!("Failed to listen for Ctrl+C: {}", e),
            }
        });
    });
}
