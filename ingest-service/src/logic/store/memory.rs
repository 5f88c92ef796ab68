//! In-memory store for pipeline tests

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::{ReadingStore, StoreError};
use crate::logic::document::{PersistedDocument, StoredDocument};

#[derive(Default)]
pub struct MemoryReadingStore {
    docs: Mutex<Vec<StoredDocument>>,
    fail_appends: AtomicBool,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following append fail, simulating an unavailable store
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail_appends.store(unavailable, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.docs.lock().len()
    }
}

impl ReadingStore for MemoryReadingStore {
    fn append(&self, document: &PersistedDocument) -> Result<StoredDocument, StoreError> {
        if self.fail_appends.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }

        let mut docs = self.docs.lock();
        let stored = StoredDocument {
            id: format!("mem-{}", docs.len() + 1),
            document: document.clone(),
        };
        docs.push(stored.clone());
        Ok(stored)
    }

    fn latest(&self, limit: usize) -> Result<Vec<StoredDocument>, StoreError> {
        let mut docs = self.docs.lock().clone();
        // stable: ties keep insertion order
        docs.sort_by_key(|d| d.document.capture_time_ms);
        let start = docs.len().saturating_sub(limit);
        Ok(docs.split_off(start))
    }
}
