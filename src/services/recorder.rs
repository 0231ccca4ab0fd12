// src/services/recorder.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    models::{
        question::Question,
        score::{CompletionStatus, Score},
    },
    services::{
        gate::{self, GateDecision},
        matcher::{self, SubmittedAnswer},
        store,
    },
};

/// One quiz submission as handed over by the web layer.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Keyed by question id.
    pub answers: HashMap<i64, SubmittedAnswer>,
    /// Seconds per question id.
    pub times: HashMap<i64, i64>,
    /// Client-measured total, preferred when positive.
    pub total_time: Option<i64>,
    pub status: CompletionStatus,
}

/// Grading result for one answered question.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub submitted_answer: String,
    pub is_correct: bool,
    pub marks_awarded: f64,
    pub time_spent: i64,
}

/// Totals for a whole attempt plus its per-question records.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAttempt {
    pub total_scored: f64,
    pub time_spent: i64,
    pub questions_answered: i64,
    pub questions_correct: i64,
    pub total_questions: i64,
    pub answers: Vec<GradedAnswer>,
}

#[derive(Debug)]
pub enum SubmitError {
    QuizNotFound,
    /// The scheduling gate refused the attempt (never `AlreadyAttempted`).
    Denied(GateDecision),
    AlreadySubmitted,
    Persistence(sqlx::Error),
}

impl From<sqlx::Error> for SubmitError {
    /// A unique violation on `scores` means a concurrent submission won the race.
    fn from(err: sqlx::Error) -> Self {
        let duplicate = err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());
        if duplicate {
            SubmitError::AlreadySubmitted
        } else {
            SubmitError::Persistence(err)
        }
    }
}

/// Grades every question of the quiz in id order. Questions without a
/// submission count toward `total_questions` only.
pub fn grade(
    questions: &[Question],
    answers: &HashMap<i64, SubmittedAnswer>,
    times: &HashMap<i64, i64>,
    total_time: Option<i64>,
) -> GradedAttempt {
    let mut ordered: Vec<&Question> = questions.iter().collect();
    ordered.sort_by_key(|q| q.id);

    let mut graded = GradedAttempt {
        total_scored: 0.0,
        time_spent: 0,
        questions_answered: 0,
        questions_correct: 0,
        total_questions: ordered.len() as i64,
        answers: Vec::new(),
    };
    let mut tracked_time: i64 = 0;

    for question in ordered {
        let seconds = times.get(&question.id).copied().unwrap_or(0).max(0);
        tracked_time = tracked_time.saturating_add(seconds);

        let Some(answer) = answers.get(&question.id).filter(|a| !a.is_blank()) else {
            continue;
        };

        let evaluation = matcher::evaluate(question, answer);
        graded.questions_answered += 1;
        graded.total_scored += evaluation.marks_awarded;
        if evaluation.is_correct {
            graded.questions_correct += 1;
        }
        graded.answers.push(GradedAnswer {
            question_id: question.id,
            submitted_answer: answer.raw(),
            is_correct: evaluation.is_correct,
            marks_awarded: evaluation.marks_awarded,
            time_spent: seconds,
        });
    }

    graded.time_spent = match total_time {
        Some(total) if total > 0 => total,
        _ => tracked_time,
    };
    graded
}

/// Runs the whole submission: gate, grading and the atomic write.
pub async fn submit(
    pool: &SqlitePool,
    quiz_id: i64,
    user_id: i64,
    submission: &Submission,
    now: DateTime<Utc>,
) -> Result<Score, SubmitError> {
    let quiz = store::find_quiz(pool, quiz_id)
        .await?
        .ok_or(SubmitError::QuizNotFound)?;
    let questions = store::quiz_questions(pool, quiz_id).await?;
    let existing = store::count_attempts(pool, quiz_id, user_id).await?;

    match gate::can_attempt(&quiz, questions.len() as i64, now, existing) {
        GateDecision::Allowed => {}
        GateDecision::AlreadyAttempted => return Err(SubmitError::AlreadySubmitted),
        denied => return Err(SubmitError::Denied(denied)),
    }

    let graded = grade(
        &questions,
        &submission.answers,
        &submission.times,
        submission.total_time,
    );

    persist(pool, quiz_id, user_id, existing + 1, &graded, submission.status, now).await
}

/// Writes the score and its question attempts in one transaction.
/// Dropping the transaction on any early return rolls everything back.
pub async fn persist(
    pool: &SqlitePool,
    quiz_id: i64,
    user_id: i64,
    attempt_number: i64,
    graded: &GradedAttempt,
    status: CompletionStatus,
    now: DateTime<Utc>,
) -> Result<Score, SubmitError> {
    let mut tx = pool.begin().await?;

    let score: Score = sqlx::query_as(
        r#"
        INSERT INTO scores (
            quiz_id, user_id, attempt_number, total_scored, time_spent,
            questions_answered, questions_correct, total_questions,
            completion_status, time_stamp_of_attempt
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(quiz_id)
    .bind(user_id)
    .bind(attempt_number)
    .bind(graded.total_scored)
    .bind(graded.time_spent)
    .bind(graded.questions_answered)
    .bind(graded.questions_correct)
    .bind(graded.total_questions)
    .bind(status)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for answer in &graded.answers {
        sqlx::query(
            r#"
            INSERT INTO question_attempts
                (score_id, question_id, submitted_answer, is_correct, marks_awarded, time_spent)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(score.id)
        .bind(answer.question_id)
        .bind(&answer.submitted_answer)
        .bind(answer.is_correct)
        .bind(answer.marks_awarded)
        .bind(answer.time_spent)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        "Recorded score {} for user {} on quiz {}: {}/{} correct, {} marks, {}s ({})",
        score.id,
        user_id,
        quiz_id,
        score.questions_correct,
        score.total_questions,
        score.total_scored,
        score.time_spent,
        score.completion_status
    );

    Ok(score)
}
