use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::score::ScoreListEntry,
    services::reports,
    utils::jwt::CurrentUser,
};

/// Lists the caller's attempts, newest first.
pub async fn list_my_scores(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let scores: Vec<ScoreListEntry> = sqlx::query_as(
        r#"
        SELECT
            s.id, s.quiz_id, q.name AS quiz_name, s.attempt_number,
            s.total_scored, s.time_spent, s.questions_correct, s.total_questions,
            s.completion_status, s.time_stamp_of_attempt
        FROM scores s
        JOIN quizzes q ON s.quiz_id = q.id
        WHERE s.user_id = ?
        ORDER BY s.time_stamp_of_attempt DESC, s.id DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list scores: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(scores))
}

/// Result page for one attempt. Visible to its owner and to admins.
pub async fn get_score(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(score_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = reports::score_detail(&pool, score_id)
        .await?
        .ok_or(AppError::NotFound("Score not found".to_string()))?;

    if detail.score.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden("This result belongs to another user".to_string()));
    }

    Ok(Json(detail))
}
