// src/handlers/analytics.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::analytics::{SummaryParams, SummarySort},
    services::reports,
    utils::jwt::CurrentUser,
};

/// Dashboard summary for the caller.
pub async fn my_summary(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let summary = reports::user_summary(&pool, user.id).await?;
    Ok(Json(summary))
}

/// Statistics for one quiz.
/// Admin only.
pub async fn quiz_stats(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = reports::quiz_stats(&pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;
    Ok(Json(stats))
}

/// Report of every attempt with per-user totals for charting.
/// Admin only. `sort_by` is one of user, subject, quiz, score, time.
pub async fn admin_summary(
    State(pool): State<SqlitePool>,
    Query(params): Query<SummaryParams>,
) -> Result<impl IntoResponse, AppError> {
    let sort = SummarySort::parse(params.sort_by.as_deref());
    let summary = reports::admin_summary(&pool, sort).await?;
    Ok(Json(summary))
}
