// src/services/analytics.rs

//! Read-side statistics. Every function here is a pure function of stored
//! rows; ratios with a zero denominator come out as 0.

use std::collections::HashMap;

use crate::models::{
    analytics::{AttemptFact, DifficultyBucket, SummaryRow, SummarySort, TopicRanking, TopicTime},
    question::Difficulty,
    score::PassFail,
};

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

/// `questions_correct / total_questions × 100`.
pub fn accuracy(questions_correct: i64, total_questions: i64) -> f64 {
    ratio(questions_correct as f64, total_questions as f64)
}

/// Share of the quiz's scores (`totals`, the target's own score included)
/// that lie strictly below `target`.
pub fn percentile(target: f64, totals: &[f64]) -> f64 {
    let below = totals.iter().filter(|&&t| t < target).count();
    ratio(below as f64, totals.len() as f64)
}

/// Scores recorded for a quiz per registered student.
pub fn completion_rate(score_count: usize, student_count: i64) -> f64 {
    ratio(score_count as f64, student_count as f64)
}

pub fn pass_fail(total_scored: f64, passing_score: f64) -> PassFail {
    if total_scored >= passing_score {
        PassFail::Pass
    } else {
        PassFail::Fail
    }
}

pub fn pass_rate(totals: &[f64], passing_score: f64) -> f64 {
    let passed = totals
        .iter()
        .filter(|&&t| pass_fail(t, passing_score) == PassFail::Pass)
        .count();
    ratio(passed as f64, totals.len() as f64)
}

pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample standard deviation of per-score accuracies.
pub fn consistency(accuracies: &[f64]) -> f64 {
    if accuracies.len() < 2 {
        return 0.0;
    }
    let mean = average(accuracies);
    let variance = accuracies
        .iter()
        .map(|a| (a - mean).powi(2))
        .sum::<f64>()
        / (accuracies.len() - 1) as f64;
    variance.sqrt()
}

/// Label for a difficulty outside Easy/Medium/Hard. Blank labels group as "Unknown".
fn unknown_label(raw: &str) -> String {
    match raw.trim() {
        "" => "Unknown".to_string(),
        label => label.to_string(),
    }
}

/// Attempted/correct counts per difficulty: Easy, Medium, Hard, then any
/// unrecognised labels alphabetically.
pub fn difficulty_breakdown(facts: &[AttemptFact]) -> Vec<DifficultyBucket> {
    // (known rank or None, label) -> (attempted, correct)
    let mut buckets: HashMap<(Option<Difficulty>, String), (i64, i64)> = HashMap::new();

    for fact in facts {
        let key = match Difficulty::parse(&fact.difficulty) {
            Some(level) => (Some(level), level.as_str().to_string()),
            None => (None, unknown_label(&fact.difficulty)),
        };
        let entry = buckets.entry(key).or_insert((0, 0));
        entry.0 += 1;
        if fact.is_correct {
            entry.1 += 1;
        }
    }

    let mut ordered: Vec<_> = buckets.into_iter().collect();
    // Known levels first in their own order; `None` sorts after every `Some` here.
    ordered.sort_by(|((a_level, a_label), _), ((b_level, b_label), _)| {
        match (a_level, b_level) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a_label.cmp(b_label),
        }
    });

    ordered
        .into_iter()
        .map(|((_, label), (attempted, correct))| DifficultyBucket {
            difficulty: label,
            attempted,
            correct,
            accuracy: accuracy(correct, attempted),
        })
        .collect()
}

/// Average time per chapter, most time-consuming first. Ties keep chapter id order.
pub fn topic_times(facts: &[AttemptFact]) -> Vec<TopicTime> {
    let mut per_chapter: HashMap<i64, (String, i64, i64)> = HashMap::new();
    for fact in facts {
        let entry = per_chapter
            .entry(fact.chapter_id)
            .or_insert_with(|| (fact.chapter_name.clone(), 0, 0));
        entry.1 = entry.1.saturating_add(fact.time_spent.max(0));
        entry.2 += 1;
    }

    let mut topics: Vec<TopicTime> = per_chapter
        .into_iter()
        .map(|(chapter_id, (chapter_name, total, attempts))| TopicTime {
            chapter_id,
            chapter_name,
            average_time: total as f64 / attempts as f64,
            attempts,
        })
        .collect();

    topics.sort_by_key(|t| t.chapter_id);
    topics.sort_by(|a, b| b.average_time.total_cmp(&a.average_time));
    topics
}

/// Top `n` chapters by average time, and the bottom `n` with the fastest first.
pub fn rank_topics(facts: &[AttemptFact], n: usize) -> TopicRanking {
    let topics = topic_times(facts);
    let time_consuming = topics.iter().take(n).cloned().collect();
    let time_efficient = topics.iter().rev().take(n).cloned().collect();
    TopicRanking {
        time_consuming,
        time_efficient,
    }
}

/// Total score per user, in order of first appearance.
pub fn score_per_user(rows: &[SummaryRow]) -> (Vec<String>, Vec<f64>) {
    let mut labels: Vec<String> = Vec::new();
    let mut totals: Vec<f64> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        match index.get(row.username.as_str()) {
            Some(&i) => totals[i] += row.total_scored,
            None => {
                index.insert(&row.username, labels.len());
                labels.push(row.username.clone());
                totals.push(row.total_scored);
            }
        }
    }
    (labels, totals)
}

/// Orders the admin summary. Names sort ascending, scores and times descending;
/// ties fall back to the score id.
pub fn sort_summary(rows: &mut [SummaryRow], sort: SummarySort) {
    rows.sort_by(|a, b| {
        let primary = match sort {
            SummarySort::User => a.username.cmp(&b.username),
            SummarySort::Subject => a.subject_name.cmp(&b.subject_name),
            SummarySort::Quiz => a.quiz_name.cmp(&b.quiz_name),
            SummarySort::Score => b.total_scored.total_cmp(&a.total_scored),
            SummarySort::Time => b.time_spent.cmp(&a.time_spent),
        };
        primary.then(a.score_id.cmp(&b.score_id))
    });
}
