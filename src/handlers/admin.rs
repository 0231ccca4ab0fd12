// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        comment::{CreateScoreCommentRequest, ScoreComment},
        question::{CreateQuestionRequest, Difficulty, QuestionType},
        quiz::CreateQuizRequest,
    },
    services::{answer_key, store},
    utils::{html::clean_comment, jwt::CurrentUser},
};

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}

/// Creates a quiz under an existing chapter.
/// Admin only.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    if !payload.window_is_valid() {
        return Err(AppError::BadRequest(
            "end_time cannot be earlier than start_time".to_string(),
        ));
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes
            (chapter_id, name, time_duration, start_time, end_time,
             passing_score, allow_retakes, attempt_limit)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(payload.chapter_id)
    .bind(&payload.name)
    .bind(payload.time_duration)
    .bind(payload.start_time)
    .bind(payload.end_time)
    .bind(payload.passing_score)
    .bind(payload.allow_retakes)
    .bind(payload.attempt_limit)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            AppError::NotFound("Chapter not found".to_string())
        } else {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    tracing::info!("Quiz {} created in chapter {}", id, payload.chapter_id);

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Adds a question to a quiz.
/// Admin only. The answer key is resolved to option text before it is stored.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    store::find_quiz(&pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let kind = QuestionType::parse(&payload.question_type);
    if matches!(kind, QuestionType::Single | QuestionType::MultiSelect) && payload.options.len() < 2 {
        return Err(AppError::BadRequest(
            "Choice questions need at least two options".to_string(),
        ));
    }

    let slots: Vec<(usize, &str)> = payload
        .options
        .iter()
        .enumerate()
        .map(|(i, text)| (i + 1, text.as_str()))
        .collect();
    let correct_option = answer_key::canonicalize(kind, &payload.correct_option, &slots)?;

    // Validated above, so the fallback is never taken.
    let difficulty = Difficulty::parse(&payload.difficulty).unwrap_or(Difficulty::Medium);
    let option = |i: usize| payload.options.get(i).map(|o| o.trim().to_string());

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions
            (quiz_id, question_statement, option1, option2, option3, option4, option5, option6,
             question_type, correct_option, marks, difficulty, image_url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(&payload.question_statement)
    .bind(option(0))
    .bind(option(1))
    .bind(option(2))
    .bind(option(3))
    .bind(option(4))
    .bind(option(5))
    .bind(kind.as_str())
    .bind(&correct_option)
    .bind(payload.marks)
    .bind(difficulty.as_str())
    .bind(&payload.image_url)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "correct_option": correct_option })),
    ))
}

/// Attaches reviewer feedback to an attempt.
/// Admin only.
pub async fn add_comment(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(score_id): Path<i64>,
    Json(payload): Json<CreateScoreCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    let content = clean_comment(&payload.content);
    if content.is_empty() {
        return Err(AppError::BadRequest("Comment is empty after sanitization".to_string()));
    }

    store::find_score(&pool, score_id)
        .await?
        .ok_or(AppError::NotFound("Score not found".to_string()))?;

    let comment: ScoreComment = sqlx::query_as(
        r#"
        INSERT INTO score_comments (score_id, author_id, content, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(score_id)
    .bind(user.id)
    .bind(&content)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to add comment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Deletes a reviewer comment.
/// Admin only.
pub async fn delete_comment(
    State(pool): State<SqlitePool>,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM score_comments WHERE id = ?")
        .bind(comment_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
