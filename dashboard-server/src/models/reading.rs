//! Reading model
//!
//! Row của `sensor_readings` và JSON shape mà dashboard chart đọc.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

pub const DEFAULT_LATEST_LIMIT: i64 = 100;
pub const MAX_LATEST_LIMIT: i64 = 1000;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ReadingRow {
    pub id: String,
    pub node: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub light: Option<f64>,
    pub gas: Option<f64>,
    pub rule_risk: Option<f64>,
    pub ml_predicted_label: Option<String>,
    pub ml_confidence: Option<f64>,
    pub ml_risk: Option<f64>,
    pub server_time: f64,
    pub capture_time_ms: i64,
}

/// Wire shape of one reading. Keys are what the dashboard page expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingView {
    pub id: String,
    pub timestamp: f64,
    pub timestamp_ms: i64,
    pub node: Option<String>,

    // sensor data
    pub temp: Option<f64>,
    pub hum: Option<f64>,
    pub soil: Option<f64>,
    pub light: Option<f64>,
    pub gas: Option<f64>,

    // risks: ml_risk is primary
    pub ml_risk: Option<f64>,
    pub risk_rule: Option<f64>,

    pub ml_pred_label: Option<String>,
    pub ml_pred_prob: Option<f64>,
}

impl From<ReadingRow> for ReadingView {
    fn from(row: ReadingRow) -> Self {
        Self {
            id: row.id,
            timestamp: row.server_time,
            timestamp_ms: row.capture_time_ms,
            node: row.node,
            temp: row.temperature,
            hum: row.humidity,
            soil: row.soil_moisture,
            light: row.light,
            gas: row.gas,
            ml_risk: row.ml_risk,
            risk_rule: row.rule_risk,
            ml_pred_label: row.ml_predicted_label,
            ml_pred_prob: row.ml_confidence,
        }
    }
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct LatestQuery {
    #[validate(range(min = 1, max = MAX_LATEST_LIMIT))]
    pub limit: Option<i64>,
}

impl LatestQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LATEST_LIMIT)
    }
}

impl ReadingRow {
    /// Most recent `limit` readings by capture time, returned oldest first
    pub async fn latest(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let mut rows = sqlx::query_as::<_, ReadingRow>(
            r#"
            SELECT
                id, node, temperature, humidity, soil_moisture, light, gas,
                rule_risk, ml_predicted_label, ml_confidence, ml_risk,
                server_time, capture_time_ms
            FROM sensor_readings
            ORDER BY capture_time_ms DESC, rowid DESC
            LIMIT $1
            "#
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        // oldest -> newest for charts
        rows.reverse();
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    /// In-memory pool; one connection so every query sees the same database
    pub async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::ensure_schema(&pool).await.unwrap();
        pool
    }

    pub async fn insert(pool: &SqlitePool, id: &str, capture_time_ms: i64, ml_risk: Option<f64>) {
        sqlx::query(
            r#"
            INSERT INTO sensor_readings (
                id, node, temperature, humidity, soil_moisture, gas,
                rule_risk, ml_predicted_label, ml_confidence, ml_risk,
                server_time, capture_time_ms
            ) VALUES ($1, 'Tomato', 24.5, 60, 33, 120, 0.9, 'Aphids', 0.8, $2, $3, $4)
            "#
        )
        .bind(id)
        .bind(ml_risk)
        .bind(capture_time_ms as f64 / 1000.0)
        .bind(capture_time_ms)
        .execute(pool)
        .await
        .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{insert, memory_pool};
    use super::*;

    #[tokio::test]
    async fn test_latest_is_oldest_first() {
        let pool = memory_pool().await;
        insert(&pool, "b", 2_000, Some(0.2)).await;
        insert(&pool, "a", 1_000, Some(0.1)).await;
        insert(&pool, "c", 3_000, Some(0.3)).await;

        let rows = ReadingRow::latest(&pool, 2).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_latest_on_empty_table() {
        let pool = memory_pool().await;
        assert!(ReadingRow::latest(&pool, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_view_keys() {
        let pool = memory_pool().await;
        insert(&pool, "a", 1_700_000_000_000, None).await;

        let row = ReadingRow::latest(&pool, 1).await.unwrap().remove(0);
        assert_eq!(row.light, None);

        let json = serde_json::to_value(ReadingView::from(row)).unwrap();
        assert_eq!(json["timestamp_ms"], 1_700_000_000_000i64);
        assert_eq!(json["timestamp"], 1_700_000_000.0);
        assert_eq!(json["temp"], 24.5);
        assert_eq!(json["risk_rule"], 0.9);
        assert_eq!(json["ml_pred_label"], "Aphids");
        assert_eq!(json["ml_pred_prob"], 0.8);
        assert!(json["ml_risk"].is_null());
        assert!(json["light"].is_null());

        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "gas", "hum", "id", "light", "ml_pred_label", "ml_pred_prob", "ml_risk", "node",
                "risk_rule", "soil", "temp", "timestamp", "timestamp_ms",
            ]
        );
    }

    #[test]
    fn test_limit_validation() {
        assert_eq!(LatestQuery::default().limit(), DEFAULT_LATEST_LIMIT);
        assert!(LatestQuery { limit: Some(1) }.validate().is_ok());
        assert!(LatestQuery { limit: Some(MAX_LATEST_LIMIT) }.validate().is_ok());
        assert!(LatestQuery { limit: Some(0) }.validate().is_err());
        assert!(LatestQuery { limit: Some(1001) }.validate().is_err());
    }
}
