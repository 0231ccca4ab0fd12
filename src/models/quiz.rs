// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub chapter_id: i64,
    pub name: String,

    /// Duration in minutes.
    pub time_duration: i64,

    /// Scheduling window. Either bound may be open.
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,

    pub passing_score: f64,

    /// Whether a student may attempt the quiz more than once.
    pub allow_retakes: bool,

    /// Upper bound on attempts when retakes are allowed. `None` means unlimited.
    pub attempt_limit: Option<i64>,
}

/// DTO for creating a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    pub chapter_id: i64,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(range(min = 1, max = 1440))]
    pub time_duration: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(range(min = 0.0))]
    pub passing_score: f64,
    #[serde(default)]
    pub allow_retakes: bool,
    #[validate(range(min = 1))]
    pub attempt_limit: Option<i64>,
}

impl CreateQuizRequest {
    /// `end_time` may not precede `start_time` when both are set.
    pub fn window_is_valid(&self) -> bool {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end >= start,
            _ => true,
        }
    }
}
