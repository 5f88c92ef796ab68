//! SQLite Reading Store
//!
//! Một table `sensor_readings`, mỗi field một column.
//! Schema tạo nếu chưa có; không có migration.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{ReadingStore, StoreError};
use crate::logic::document::{PersistedDocument, StoredDocument};

/// Table schema. Keep in sync with the dashboard server's reader.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sensor_readings (
    id TEXT PRIMARY KEY,
    node TEXT,
    temperature REAL,
    humidity REAL,
    soil_moisture REAL,
    light REAL,
    gas REAL,
    rule_risk REAL,
    ml_predicted_label TEXT,
    ml_confidence REAL,
    ml_risk REAL,
    server_time REAL NOT NULL,
    capture_time_ms INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sensor_readings_capture ON sensor_readings(capture_time_ms);
"#;

const INSERT_SQL: &str = r#"
INSERT INTO sensor_readings (
    id, node, temperature, humidity, soil_moisture, light, gas,
    rule_risk, ml_predicted_label, ml_confidence, ml_risk,
    server_time, capture_time_ms
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
"#;

const LATEST_SQL: &str = r#"
SELECT
    id, node, temperature, humidity, soil_moisture, light, gas,
    rule_risk, ml_predicted_label, ml_confidence, ml_risk,
    server_time, capture_time_ms
FROM sensor_readings
ORDER BY capture_time_ms DESC, rowid DESC
LIMIT ?1
"#;

pub struct SqliteReadingStore {
    conn: Mutex<Connection>,
}

impl SqliteReadingStore {
    /// Open (or create) the database file and apply the schema
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if path.is_dir() {
            return Err(StoreError::Unavailable(format!("{} is a directory", path.display())));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ReadingStore for SqliteReadingStore {
    fn append(&self, document: &PersistedDocument) -> Result<StoredDocument, StoreError> {
        let id = Uuid::new_v4().to_string();
        let d = document;

        self.conn.lock().execute(
            INSERT_SQL,
            params![
                id,
                d.node,
                d.temperature,
                d.humidity,
                d.soil_moisture,
                d.light,
                d.gas,
                d.rule_risk,
                d.ml_predicted_label,
                d.ml_confidence,
                d.ml_risk,
                d.server_time,
                d.capture_time_ms,
            ],
        )?;

        Ok(StoredDocument {
            id,
            document: document.clone(),
        })
    }

    fn latest(&self, limit: usize) -> Result<Vec<StoredDocument>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(LATEST_SQL)?;
        let mut docs = stmt
            .query_map(params![limit as i64], row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;

        // newest-first from SQL, oldest-first for charts
        docs.reverse();
        Ok(docs)
    }
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<StoredDocument> {
    Ok(StoredDocument {
        id: row.get(0)?,
        document: PersistedDocument {
            node: row.get(1)?,
            temperature: row.get(2)?,
            humidity: row.get(3)?,
            soil_moisture: row.get(4)?,
            light: row.get(5)?,
            gas: row.get(6)?,
            rule_risk: row.get(7)?,
            ml_predicted_label: row.get(8)?,
            ml_confidence: row.get(9)?,
            ml_risk: row.get(10)?,
            server_time: row.get(11)?,
            capture_time_ms: row.get(12)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(capture_time_ms: i64, gas: Option<f64>) -> PersistedDocument {
        PersistedDocument {
            node: Some("Tomato".to_string()),
            temperature: Some(24.5),
            humidity: Some(60.0),
            soil_moisture: None,
            light: None,
            gas,
            rule_risk: Some(0.9),
            ml_predicted_label: Some("Aphids".to_string()),
            ml_confidence: Some(0.65),
            ml_risk: Some(0.65),
            server_time: capture_time_ms as f64 / 1000.0,
            capture_time_ms,
        }
    }

    #[test]
    fn test_append_and_latest() {
        let store = SqliteReadingStore::open_in_memory().unwrap();
        let stored = store.append(&document(1_000, Some(120.0))).unwrap();
        assert!(!stored.id.is_empty());

        let latest = store.latest(10).unwrap();
        assert_eq!(latest, vec![stored]);
    }

    #[test]
    fn test_nulls_round_trip() {
        let store = SqliteReadingStore::open_in_memory().unwrap();
        let mut doc = document(1_000, None);
        doc.node = None;
        doc.ml_predicted_label = None;
        doc.ml_confidence = None;
        doc.ml_risk = None;
        store.append(&doc).unwrap();

        let latest = store.latest(1).unwrap();
        assert_eq!(latest[0].document, doc);
    }

    #[test]
    fn test_latest_orders_by_capture_time_ascending() {
        let store = SqliteReadingStore::open_in_memory().unwrap();
        for ts in [3_000, 1_000, 5_000, 2_000, 4_000] {
            store.append(&document(ts, Some(ts as f64))).unwrap();
        }

        let latest = store.latest(3).unwrap();
        let times: Vec<i64> = latest.iter().map(|d| d.document.capture_time_ms).collect();
        assert_eq!(times, vec![3_000, 4_000, 5_000]);
    }

    #[test]
    fn test_capture_time_ties_keep_insertion_order() {
        let store = SqliteReadingStore::open_in_memory().unwrap();
        store.append(&document(1_000, Some(1.0))).unwrap();
        store.append(&document(1_000, Some(2.0))).unwrap();

        let gas: Vec<Option<f64>> = store.latest(2).unwrap().iter().map(|d| d.document.gas).collect();
        assert_eq!(gas, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_open_creates_file_and_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("farm_iot.db");

        {
            let store = SqliteReadingStore::open(&path).unwrap();
            store.append(&document(1_000, Some(1.0))).unwrap();
        }
        assert!(path.exists());

        // reopen: schema is idempotent and data survives
        let store = SqliteReadingStore::open(&path).unwrap();
        assert_eq!(store.latest(10).unwrap().len(), 1);
    }

    #[test]
    fn test_open_directory_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();

        let result = SqliteReadingStore::open(dir.path());

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
