// src/models/score.rs

use std::{collections::HashMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::comment::ScoreComment;

/// Represents the 'scores' table in the database.
/// One row per completed or timed-out attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Score {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub attempt_number: i64,
    pub total_scored: f64,
    /// Seconds.
    pub time_spent: i64,
    pub questions_answered: i64,
    pub questions_correct: i64,
    pub total_questions: i64,
    pub completion_status: CompletionStatus,
    pub time_stamp_of_attempt: DateTime<Utc>,
}

/// Represents the 'question_attempts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionAttempt {
    pub id: i64,
    pub score_id: i64,
    pub question_id: i64,
    /// Raw answer as submitted; multiselect answers are comma-joined.
    pub submitted_answer: String,
    /// True only for full credit.
    pub is_correct: bool,
    pub marks_awarded: f64,
    pub time_spent: i64,
}

/// Stored as text. Rows holding any other value fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum CompletionStatus {
    Completed,
    Partial,
    Abandoned,
    #[serde(rename = "Timed Out")]
    #[sqlx(rename = "Timed Out")]
    TimedOut,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "Completed",
            CompletionStatus::Partial => "Partial",
            CompletionStatus::Abandoned => "Abandoned",
            CompletionStatus::TimedOut => "Timed Out",
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassFail {
    Pass,
    Fail,
}

impl fmt::Display for PassFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassFail::Pass => f.write_str("Pass"),
            PassFail::Fail => f.write_str("Fail"),
        }
    }
}

/// Score listing row for the student's "my scores" page.
#[derive(Debug, Serialize, FromRow)]
pub struct ScoreListEntry {
    pub id: i64,
    pub quiz_id: i64,
    pub quiz_name: String,
    pub attempt_number: i64,
    pub total_scored: f64,
    pub time_spent: i64,
    pub questions_correct: i64,
    pub total_questions: i64,
    pub completion_status: CompletionStatus,
    pub time_stamp_of_attempt: DateTime<Utc>,
}

/// Full result page for one attempt.
#[derive(Debug, Serialize)]
pub struct ScoreDetail {
    pub score: Score,
    pub quiz_name: String,
    pub max_marks: i64,
    pub accuracy: f64,
    pub percentile: f64,
    pub pass_fail: PassFail,
    pub attempts: Vec<QuestionAttempt>,
    pub comments: Vec<ScoreComment>,
}

/// JSON payload posted by the client when the quiz timer runs out.
#[derive(Debug, Deserialize)]
pub struct TimeoutRequest {
    /// Key: question id, value: answer text (multiselect comma-joined).
    #[serde(default)]
    pub answers: HashMap<i64, String>,
    /// Per-question seconds tracked by the client, if any.
    #[serde(default)]
    pub times: HashMap<i64, i64>,
    pub total_time: Option<i64>,
}
