// src/services/store.rs

//! Row lookups shared by the submission path and the read-side reports.

use sqlx::SqlitePool;

use crate::models::{question::Question, quiz::Quiz, score::Score};

pub async fn find_quiz(pool: &SqlitePool, quiz_id: i64) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, chapter_id, name, time_duration, start_time, end_time,
               passing_score, allow_retakes, attempt_limit
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(pool)
    .await
}

/// Questions of a quiz in stable (id) order.
pub async fn quiz_questions(pool: &SqlitePool, quiz_id: i64) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM questions WHERE quiz_id = ? ORDER BY id")
        .bind(quiz_id)
        .fetch_all(pool)
        .await
}

pub async fn count_attempts(pool: &SqlitePool, quiz_id: i64, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM scores WHERE quiz_id = ? AND user_id = ?")
        .bind(quiz_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn find_score(pool: &SqlitePool, score_id: i64) -> Result<Option<Score>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM scores WHERE id = ?")
        .bind(score_id)
        .fetch_optional(pool)
        .await
}

/// All `total_scored` values recorded for a quiz.
pub async fn quiz_totals(pool: &SqlitePool, quiz_id: i64) -> Result<Vec<f64>, sqlx::Error> {
    sqlx::query_scalar("SELECT total_scored FROM scores WHERE quiz_id = ? ORDER BY id")
        .bind(quiz_id)
        .fetch_all(pool)
        .await
}

pub async fn count_students(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'student'")
        .fetch_one(pool)
        .await
}
