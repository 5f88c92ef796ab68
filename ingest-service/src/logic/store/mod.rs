//! Store Module - Append-only reading sink
//!
//! - `sqlite`: rusqlite-backed store shared with the dashboard server
//! - `memory`: in-process store for tests

pub mod sqlite;

#[cfg(test)]
pub mod memory;

use thiserror::Error;

use super::document::{PersistedDocument, StoredDocument};

pub use sqlite::SqliteReadingStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("failed to prepare store directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only document sink with latest-N retrieval
pub trait ReadingStore: Send {
    /// Insert one document, returning it with its assigned id
    fn append(&self, document: &PersistedDocument) -> Result<StoredDocument, StoreError>;

    /// Most recent `limit` documents by capture time, oldest first
    fn latest(&self, limit: usize) -> Result<Vec<StoredDocument>, StoreError>;
}
