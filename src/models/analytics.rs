// src/models/analytics.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::score::PassFail;

/// Attempted/correct counts for one difficulty level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyBucket {
    pub difficulty: String,
    pub attempted: i64,
    pub correct: i64,
    pub accuracy: f64,
}

/// Average time spent on questions of one chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicTime {
    pub chapter_id: i64,
    pub chapter_name: String,
    pub average_time: f64,
    pub attempts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicRanking {
    pub time_consuming: Vec<TopicTime>,
    pub time_efficient: Vec<TopicTime>,
}

/// One question attempt joined with the question's difficulty and chapter.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptFact {
    pub is_correct: bool,
    pub time_spent: i64,
    pub difficulty: String,
    pub chapter_id: i64,
    pub chapter_name: String,
}

/// One point of a student's progress timeline.
#[derive(Debug, Serialize)]
pub struct TimelinePoint {
    pub score_id: i64,
    pub quiz_id: i64,
    pub quiz_name: String,
    pub total_scored: f64,
    pub accuracy: f64,
    pub percentile: f64,
    pub pass_fail: PassFail,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub user_id: i64,
    pub total_attempts: usize,
    pub passed: usize,
    pub average_accuracy: f64,
    pub average_time: f64,
    pub consistency: f64,
    pub total_correct: i64,
    pub total_incorrect: i64,
    pub timeline: Vec<TimelinePoint>,
    pub difficulty: Vec<DifficultyBucket>,
    pub topics: TopicRanking,
}

#[derive(Debug, Serialize)]
pub struct QuizStats {
    pub quiz_id: i64,
    pub quiz_name: String,
    pub attempts: usize,
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub average_time: f64,
    pub average_accuracy: f64,
    pub completion_rate: f64,
    pub pass_rate: f64,
    pub difficulty: Vec<DifficultyBucket>,
}

/// Row of the admin summary report.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SummaryRow {
    pub score_id: i64,
    pub total_scored: f64,
    pub time_spent: i64,
    pub time_stamp_of_attempt: DateTime<Utc>,
    pub user_id: i64,
    pub username: String,
    pub quiz_id: i64,
    pub quiz_name: String,
    pub chapter_id: i64,
    pub chapter_name: String,
    pub subject_id: i64,
    pub subject_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummarySort {
    #[default]
    User,
    Subject,
    Quiz,
    Score,
    Time,
}

impl SummarySort {
    /// Unknown keys fall back to sorting by user.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("subject") => SummarySort::Subject,
            Some("quiz") => SummarySort::Quiz,
            Some("score") => SummarySort::Score,
            Some("time") => SummarySort::Time,
            _ => SummarySort::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummarySort::User => "user",
            SummarySort::Subject => "subject",
            SummarySort::Quiz => "quiz",
            SummarySort::Score => "score",
            SummarySort::Time => "time",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub sort_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminSummary {
    pub sort_by: &'static str,
    pub rows: Vec<SummaryRow>,
    pub chart_labels: Vec<String>,
    pub chart_data: Vec<f64>,
    pub difficulty: Vec<DifficultyBucket>,
    pub topics: TopicRanking,
}
