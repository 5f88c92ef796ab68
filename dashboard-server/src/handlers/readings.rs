//! Readings handlers

use axum::{
    extract::{rejection::QueryRejection, State, Query},
    Json,
};
use validator::Validate;

use crate::{AppError, AppState, AppResult};
use crate::models::{LatestQuery, ReadingRow, ReadingView};

/// Latest N readings, oldest first
pub async fn latest(
    State(state): State<AppState>,
    query: Result<Query<LatestQuery>, QueryRejection>,
) -> AppResult<Json<Vec<ReadingView>>> {
    // limit=abc fails before validate(), vẫn phải trả JSON
    let Query(query) = query.map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;
    query.validate()?;

    let rows = ReadingRow::latest(&state.pool, query.limit()).await?;
    tracing::debug!("Serving {} readings", rows.len());

    Ok(Json(rows.into_iter().map(ReadingView::from).collect()))
}
