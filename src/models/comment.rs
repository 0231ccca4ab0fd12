use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'score_comments' table in the database.
/// Reviewer feedback attached to an attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScoreComment {
    pub id: i64,
    pub score_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// DTO for adding a reviewer comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateScoreCommentRequest {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Comment must be between 1 and 2000 characters"
    ))]
    pub content: String,
}
