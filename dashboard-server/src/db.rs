//! Database module - SQLite pool over the ingest service's store

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Create the readings table if the ingest service has not run yet
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Same table as the ingest writer. Keep both in sync.
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
