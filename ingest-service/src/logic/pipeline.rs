//! Enrichment Pipeline
//!
//! raw line -> decode -> features -> classify -> resolve -> document -> store.
//! Mỗi line decode thành công = đúng một lần `append`. Không batch, không dedup.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::decoder::{self, DecodeSkip};
use super::document::{stored_node, stored_value, PersistedDocument, StoredDocument};
use super::features;
use super::model::{ClassificationResult, RiskClassifier};
use super::reading::Reading;
use super::risk::RiskPolicy;
use super::store::{ReadingStore, StoreError};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to persist reading: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Line was not a reading; nothing was stored
    Skipped(DecodeSkip),
    Stored(StoredDocument),
}

/// Time source for `server_time` / fallback capture time
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Default)]
struct PipelineStats {
    lines_seen: AtomicU64,
    stored: AtomicU64,
    skipped: AtomicU64,
    classifier_failures: AtomicU64,
    store_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub lines_seen: u64,
    pub stored: u64,
    pub skipped: u64,
    pub classifier_failures: u64,
    pub store_failures: u64,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lines={} stored={} skipped={} ml_failures={} store_failures={}",
            self.lines_seen, self.stored, self.skipped, self.classifier_failures, self.store_failures
        )
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct EnrichmentPipeline<S: ReadingStore> {
    classifier: RiskClassifier,
    policy: RiskPolicy,
    store: S,
    clock: Box<dyn Clock>,
    stats: PipelineStats,
}

impl<S: ReadingStore> EnrichmentPipeline<S> {
    pub fn new(classifier: RiskClassifier, store: S) -> Self {
        Self {
            classifier,
            policy: RiskPolicy::default(),
            store,
            clock: Box::new(SystemClock),
            stats: PipelineStats::default(),
        }
    }

    #[cfg(test)]
    pub fn with_policy(mut self, policy: RiskPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process one transport line end to end
    pub fn process(&self, raw: &str) -> Result<ProcessOutcome, PipelineError> {
        bump(&self.stats.lines_seen);

        let reading = match decoder::decode(raw) {
            Ok(reading) => reading,
            Err(skip) => {
                decoder::log_skip(raw, &skip);
                bump(&self.stats.skipped);
                return Ok(ProcessOutcome::Skipped(skip));
            }
        };

        let document = self.enrich(&reading);

        match self.store.append(&document) {
            Ok(stored) => {
                bump(&self.stats.stored);
                log_summary(&stored.document);
                Ok(ProcessOutcome::Stored(stored))
            }
            Err(e) => {
                bump(&self.stats.store_failures);
                Err(e.into())
            }
        }
    }

    /// Reading -> document (classification included, no store access)
    pub fn enrich(&self, reading: &Reading) -> PersistedDocument {
        let vector = features::build(reading);
        log::debug!("Feature vector: {}", vector.to_log_entry());

        let result = self.classifier.classify(&vector);
        if result.is_failed() {
            bump(&self.stats.classifier_failures);
        }
        let ml_risk = self.policy.resolve(&result);

        self.assemble(reading, result, ml_risk)
    }

    fn assemble(
        &self,
        reading: &Reading,
        result: ClassificationResult,
        ml_risk: Option<f64>,
    ) -> PersistedDocument {
        let now = self.clock.now();

        PersistedDocument {
            node: stored_node(reading.node.as_ref()),
            temperature: stored_value(reading.temperature),
            humidity: stored_value(reading.humidity),
            soil_moisture: stored_value(reading.soil_moisture),
            light: stored_value(reading.light),
            gas: stored_value(reading.gas),
            rule_risk: stored_value(reading.rule_risk),
            ml_predicted_label: result.predicted_label,
            ml_confidence: result.confidence,
            ml_risk,
            server_time: now.timestamp_micros() as f64 / 1_000_000.0,
            capture_time_ms: reading.capture_time_ms.unwrap_or_else(|| now.timestamp_millis()),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        let s = &self.stats;
        StatsSnapshot {
            lines_seen: s.lines_seen.load(Ordering::Relaxed),
            stored: s.stored.load(Ordering::Relaxed),
            skipped: s.skipped.load(Ordering::Relaxed),
            classifier_failures: s.classifier_failures.load(Ordering::Relaxed),
            store_failures: s.store_failures.load(Ordering::Relaxed),
        }
    }
}

fn fmt_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

fn log_summary(doc: &PersistedDocument) {
    log::info!(
        "[OK] node={} | T={}°C | H={}% | Soil={}% | Light={} | Gas={} | ML={} | Prob={} | Risk={}",
        fmt_opt(&doc.node),
        fmt_opt(&doc.temperature),
        fmt_opt(&doc.humidity),
        fmt_opt(&doc.soil_moisture),
        fmt_opt(&doc.light),
        fmt_opt(&doc.gas),
        fmt_opt(&doc.ml_predicted_label),
        fmt_opt(&doc.ml_confidence),
        fmt_opt(&doc.ml_risk),
    );
}
