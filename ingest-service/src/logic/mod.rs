//! Logic Module - Ingestion & Enrichment
//!
//! Luồng xử lý: transport -> decoder -> features -> model -> risk -> store.
//!
//! ## Layout
//! - `features/` - Feature extraction (mq135, temp, hum, soil, crop)
//! - `model/` - ML inference (ONNX, label map, fail-open classifier)
//! - `store/` - Append-only document store (SQLite)

// Decoding
pub mod reading;
pub mod decoder;

// ML
pub mod features;
pub mod model;
pub mod risk;

// Persistence
pub mod document;
pub mod store;

// Runtime
pub mod pipeline;
pub mod transport;
pub mod ingest_loop;
