// src/services/reports.rs

//! Loads stored rows and feeds them through the analytics functions to
//! build the dashboard and result-page payloads.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    config::TOP_TOPIC_COUNT,
    models::{
        analytics::{
            AdminSummary, AttemptFact, QuizStats, SummaryRow, SummarySort, TimelinePoint,
            UserSummary,
        },
        comment::ScoreComment,
        score::{PassFail, QuestionAttempt, Score, ScoreDetail},
    },
    services::{analytics, store},
};

/// Which question attempts a breakdown covers.
#[derive(Debug, Clone, Copy)]
pub enum FactScope {
    User(i64),
    Quiz(i64),
    All,
}

/// Question attempts joined with the difficulty and chapter of their question.
pub async fn attempt_facts(pool: &SqlitePool, scope: FactScope) -> Result<Vec<AttemptFact>, sqlx::Error> {
    let mut query_builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT
            qa.is_correct,
            qa.time_spent,
            qn.difficulty,
            c.id AS chapter_id,
            c.name AS chapter_name
        FROM question_attempts qa
        JOIN scores s ON qa.score_id = s.id
        JOIN questions qn ON qa.question_id = qn.id
        JOIN quizzes q ON qn.quiz_id = q.id
        JOIN chapters c ON q.chapter_id = c.id
        "#,
    );

    match scope {
        FactScope::User(user_id) => {
            query_builder.push(" WHERE s.user_id = ").push_bind(user_id);
        }
        FactScope::Quiz(quiz_id) => {
            query_builder.push(" WHERE s.quiz_id = ").push_bind(quiz_id);
        }
        FactScope::All => {}
    }
    query_builder.push(" ORDER BY qa.id");

    query_builder.build_query_as().fetch_all(pool).await
}

#[derive(sqlx::FromRow)]
struct UserScoreRow {
    #[sqlx(flatten)]
    score: Score,
    quiz_name: String,
    passing_score: f64,
}

/// Dashboard summary for one student.
pub async fn user_summary(pool: &SqlitePool, user_id: i64) -> Result<UserSummary, sqlx::Error> {
    let mut rows: Vec<UserScoreRow> = sqlx::query_as(
        r#"
        SELECT s.*, q.name AS quiz_name, q.passing_score
        FROM scores s
        JOIN quizzes q ON s.quiz_id = q.id
        WHERE s.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.sort_by(|a, b| {
        a.score
            .time_stamp_of_attempt
            .cmp(&b.score.time_stamp_of_attempt)
            .then(a.score.id.cmp(&b.score.id))
    });

    // Every score on the quizzes this user attempted, for percentiles.
    let peer_rows: Vec<(i64, f64)> = sqlx::query_as(
        r#"
        SELECT quiz_id, total_scored
        FROM scores
        WHERE quiz_id IN (SELECT quiz_id FROM scores WHERE user_id = ?)
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    let mut peers: HashMap<i64, Vec<f64>> = HashMap::new();
    for (quiz_id, total) in peer_rows {
        peers.entry(quiz_id).or_default().push(total);
    }

    let facts = attempt_facts(pool, FactScope::User(user_id)).await?;

    let accuracies: Vec<f64> = rows
        .iter()
        .map(|r| analytics::accuracy(r.score.questions_correct, r.score.total_questions))
        .collect();
    let times: Vec<f64> = rows.iter().map(|r| r.score.time_spent as f64).collect();
    let total_correct: i64 = rows.iter().map(|r| r.score.questions_correct).sum();
    let total_incorrect: i64 = rows
        .iter()
        .map(|r| (r.score.total_questions - r.score.questions_correct).max(0))
        .sum();

    let timeline: Vec<TimelinePoint> = rows
        .iter()
        .zip(&accuracies)
        .map(|(r, &accuracy)| {
            let totals = peers.get(&r.score.quiz_id).map(Vec::as_slice).unwrap_or(&[]);
            TimelinePoint {
                score_id: r.score.id,
                quiz_id: r.score.quiz_id,
                quiz_name: r.quiz_name.clone(),
                total_scored: r.score.total_scored,
                accuracy,
                percentile: analytics::percentile(r.score.total_scored, totals),
                pass_fail: analytics::pass_fail(r.score.total_scored, r.passing_score),
                attempted_at: r.score.time_stamp_of_attempt,
            }
        })
        .collect();
    let passed = timeline
        .iter()
        .filter(|p| p.pass_fail == PassFail::Pass)
        .count();

    Ok(UserSummary {
        user_id,
        total_attempts: rows.len(),
        passed,
        average_accuracy: analytics::average(&accuracies),
        average_time: analytics::average(&times),
        consistency: analytics::consistency(&accuracies),
        total_correct,
        total_incorrect,
        timeline,
        difficulty: analytics::difficulty_breakdown(&facts),
        topics: analytics::rank_topics(&facts, TOP_TOPIC_COUNT),
    })
}

/// Statistics for one quiz. `None` when the quiz does not exist.
pub async fn quiz_stats(pool: &SqlitePool, quiz_id: i64) -> Result<Option<QuizStats>, sqlx::Error> {
    let Some(quiz) = store::find_quiz(pool, quiz_id).await? else {
        return Ok(None);
    };

    let scores: Vec<Score> = sqlx::query_as("SELECT * FROM scores WHERE quiz_id = ? ORDER BY id")
        .bind(quiz_id)
        .fetch_all(pool)
        .await?;
    let students = store::count_students(pool).await?;
    let facts = attempt_facts(pool, FactScope::Quiz(quiz_id)).await?;

    let totals: Vec<f64> = scores.iter().map(|s| s.total_scored).collect();
    let times: Vec<f64> = scores.iter().map(|s| s.time_spent as f64).collect();
    let accuracies: Vec<f64> = scores
        .iter()
        .map(|s| analytics::accuracy(s.questions_correct, s.total_questions))
        .collect();

    Ok(Some(QuizStats {
        quiz_id,
        quiz_name: quiz.name,
        attempts: scores.len(),
        average_score: analytics::average(&totals),
        highest_score: totals.iter().copied().fold(0.0, f64::max),
        lowest_score: totals.iter().copied().reduce(f64::min).unwrap_or(0.0),
        average_time: analytics::average(&times),
        average_accuracy: analytics::average(&accuracies),
        completion_rate: analytics::completion_rate(scores.len(), students),
        pass_rate: analytics::pass_rate(&totals, quiz.passing_score),
        difficulty: analytics::difficulty_breakdown(&facts),
    }))
}

/// Every attempt joined with its user, quiz, chapter and subject.
pub async fn admin_summary(pool: &SqlitePool, sort: SummarySort) -> Result<AdminSummary, sqlx::Error> {
    let mut rows: Vec<SummaryRow> = sqlx::query_as(
        r#"
        SELECT
            s.id AS score_id,
            s.total_scored,
            s.time_spent,
            s.time_stamp_of_attempt,
            u.id AS user_id,
            u.username,
            q.id AS quiz_id,
            q.name AS quiz_name,
            c.id AS chapter_id,
            c.name AS chapter_name,
            sub.id AS subject_id,
            sub.name AS subject_name
        FROM scores s
        JOIN users u ON u.id = s.user_id
        JOIN quizzes q ON q.id = s.quiz_id
        JOIN chapters c ON c.id = q.chapter_id
        JOIN subjects sub ON sub.id = c.subject_id
        "#,
    )
    .fetch_all(pool)
    .await?;
    analytics::sort_summary(&mut rows, sort);

    let (chart_labels, chart_data) = analytics::score_per_user(&rows);
    let facts = attempt_facts(pool, FactScope::All).await?;

    Ok(AdminSummary {
        sort_by: sort.as_str(),
        rows,
        chart_labels,
        chart_data,
        difficulty: analytics::difficulty_breakdown(&facts),
        topics: analytics::rank_topics(&facts, TOP_TOPIC_COUNT),
    })
}

/// Result page for one attempt. `None` when the score does not exist.
pub async fn score_detail(pool: &SqlitePool, score_id: i64) -> Result<Option<ScoreDetail>, sqlx::Error> {
    let Some(score) = store::find_score(pool, score_id).await? else {
        return Ok(None);
    };
    let Some(quiz) = store::find_quiz(pool, score.quiz_id).await? else {
        return Ok(None);
    };

    let max_marks: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(marks), 0) FROM questions WHERE quiz_id = ?")
        .bind(quiz.id)
        .fetch_one(pool)
        .await?;
    let totals = store::quiz_totals(pool, quiz.id).await?;

    let attempts: Vec<QuestionAttempt> =
        sqlx::query_as("SELECT * FROM question_attempts WHERE score_id = ? ORDER BY question_id")
            .bind(score_id)
            .fetch_all(pool)
            .await?;
    let comments: Vec<ScoreComment> =
        sqlx::query_as("SELECT * FROM score_comments WHERE score_id = ? ORDER BY id")
            .bind(score_id)
            .fetch_all(pool)
            .await?;

    Ok(Some(ScoreDetail {
        accuracy: analytics::accuracy(score.questions_correct, score.total_questions),
        percentile: analytics::percentile(score.total_scored, &totals),
        pass_fail: analytics::pass_fail(score.total_scored, quiz.passing_score),
        quiz_name: quiz.name,
        max_marks,
        score,
        attempts,
        comments,
    }))
}
