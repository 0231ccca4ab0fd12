// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    config::MAX_REPORTED_SECONDS,
    error::AppError,
    models::{
        question::PublicQuestion,
        score::{CompletionStatus, TimeoutRequest},
    },
    services::{
        gate,
        matcher::SubmittedAnswer,
        recorder::{self, SubmitError, Submission},
        store,
    },
    utils::jwt::CurrentUser,
};

/// Client timers are untrusted: keep reported seconds within `0..=MAX_REPORTED_SECONDS`.
fn clamp_seconds(seconds: i64) -> i64 {
    seconds.clamp(0, MAX_REPORTED_SECONDS)
}

/// Where the client is sent after a successful submission.
fn result_location(score_id: i64) -> String {
    format!("/api/scores/{}", score_id)
}

/// Builds a submission from the quiz form.
///
/// * `answer_<question id>`: answer text; repeated (or comma-joined) for multiselect.
/// * `time_<question id>`: seconds spent on the question.
/// * `total_time`: client-measured seconds for the whole attempt.
///
/// Unreadable numbers are ignored rather than rejected.
pub fn submission_from_form(fields: Vec<(String, String)>) -> Submission {
    let mut answers: HashMap<i64, SubmittedAnswer> = HashMap::new();
    let mut times: HashMap<i64, i64> = HashMap::new();
    let mut total_time = None;

    for (name, value) in fields {
        if let Some(id) = name.strip_prefix("answer_").and_then(|id| id.parse::<i64>().ok()) {
            answers.entry(id).or_default().push(value);
        } else if let Some(id) = name.strip_prefix("time_").and_then(|id| id.parse::<i64>().ok()) {
            if let Ok(seconds) = value.trim().parse::<i64>() {
                times.insert(id, clamp_seconds(seconds));
            }
        } else if name == "total_time" {
            total_time = value.trim().parse::<i64>().ok().map(clamp_seconds);
        }
    }

    Submission {
        answers,
        times,
        total_time,
        status: CompletionStatus::Completed,
    }
}

/// Builds a submission from the JSON sent when the quiz timer expires.
pub fn submission_from_timeout(req: TimeoutRequest) -> Submission {
    Submission {
        answers: req
            .answers
            .into_iter()
            .map(|(id, text)| (id, SubmittedAnswer::from_text(text)))
            .collect(),
        times: req
            .times
            .into_iter()
            .map(|(id, seconds)| (id, clamp_seconds(seconds)))
            .collect(),
        total_time: req.total_time.map(clamp_seconds),
        status: CompletionStatus::TimedOut,
    }
}

fn log_refusal(err: &SubmitError, quiz_id: i64, user_id: i64) {
    match err {
        SubmitError::Persistence(_) => {}
        other => tracing::info!(
            "Submission refused for user {} on quiz {}: {:?}",
            user_id,
            quiz_id,
            other
        ),
    }
}

/// Tells the student whether the quiz can be attempted right now.
pub async fn availability(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store::find_quiz(&pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;
    let questions = store::quiz_questions(&pool, quiz_id).await?;
    let existing = store::count_attempts(&pool, quiz_id, user.id).await?;

    let decision = gate::can_attempt(&quiz, questions.len() as i64, Utc::now(), existing);

    Ok(Json(serde_json::json!({
        "quiz_id": quiz.id,
        "status": decision,
        "message": decision.message(),
        "attempts_used": existing,
        "time_duration": quiz.time_duration,
    })))
}

/// Lists the quiz's questions (without answer keys) once the gate allows an attempt.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    user.require_student()?;

    let quiz = store::find_quiz(&pool, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;
    let questions = store::quiz_questions(&pool, quiz_id).await?;
    let existing = store::count_attempts(&pool, quiz_id, user.id).await?;

    let decision = gate::can_attempt(&quiz, questions.len() as i64, Utc::now(), existing);
    if !decision.is_allowed() {
        return Err(decision.into());
    }

    let paper: Vec<PublicQuestion> = questions.into_iter().map(PublicQuestion::from).collect();
    Ok(Json(paper))
}

/// Final submission of a quiz form.
///
/// Redirects (303) to the result page of the new score.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(quiz_id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    user.require_student()?;

    let submission = submission_from_form(fields);
    let score = recorder::submit(&pool, quiz_id, user.id, &submission, Utc::now())
        .await
        .map_err(|e| {
            log_refusal(&e, quiz_id, user.id);
            AppError::from(e)
        })?;

    Ok(Redirect::to(&result_location(score.id)))
}

/// Submission triggered by the client when the quiz timer runs out.
pub async fn timeout_quiz(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(quiz_id): Path<i64>,
    Json(req): Json<TimeoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_student()?;

    let submission = submission_from_timeout(req);
    let score = recorder::submit(&pool, quiz_id, user.id, &submission, Utc::now())
        .await
        .map_err(|e| {
            log_refusal(&e, quiz_id, user.id);
            AppError::from(e)
        })?;

    Ok(Json(serde_json::json!({
        "success": true,
        "score_id": score.id,
        "redirect": result_location(score.id),
    })))
}
