// src/services/gate.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::quiz::Quiz;

/// Outcome of the scheduling check that precedes every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Allowed,
    NotYetOpen,
    Closed,
    AlreadyAttempted,
    NoQuestions,
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }

    /// Flash-style message shown to the student.
    pub fn message(&self) -> &'static str {
        match self {
            GateDecision::Allowed => "Quiz is open.",
            GateDecision::NotYetOpen => "This quiz is not yet available. Please try again later.",
            GateDecision::Closed => "This quiz is no longer available.",
            GateDecision::AlreadyAttempted => "You have already attempted this quiz.",
            GateDecision::NoQuestions => "This quiz has no questions.",
        }
    }
}

/// Decides whether a student may start (or submit) an attempt.
///
/// `existing_attempts` counts the caller's stored attempts on this quiz.
/// The window is checked first, so a quiz that has not opened reports
/// `NotYetOpen` regardless of earlier attempts.
pub fn can_attempt(
    quiz: &Quiz,
    question_count: i64,
    now: DateTime<Utc>,
    existing_attempts: i64,
) -> GateDecision {
    if quiz.start_time.is_some_and(|start| now < start) {
        return GateDecision::NotYetOpen;
    }
    if quiz.end_time.is_some_and(|end| now > end) {
        return GateDecision::Closed;
    }
    if existing_attempts > 0 {
        let exhausted = !quiz.allow_retakes
            || quiz.attempt_limit.is_some_and(|limit| existing_attempts >= limit);
        if exhausted {
            return GateDecision::AlreadyAttempted;
        }
    }
    if question_count == 0 {
        return GateDecision::NoQuestions;
    }
    GateDecision::Allowed
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn quiz() -> Quiz {
        Quiz {
            id: 1,
            chapter_id: 1,
            name: "Optics".to_string(),
            time_duration: 20,
            start_time: None,
            end_time: None,
            passing_score: 5.0,
            allow_retakes: false,
            attempt_limit: None,
        }
    }

    #[test]
    fn test_open_quiz_is_allowed() {
        assert_eq!(can_attempt(&quiz(), 3, Utc::now(), 0), GateDecision::Allowed);
    }

    #[test]
    fn test_future_start_is_not_yet_open_even_after_attempts() {
        let now = Utc::now();
        let mut q = quiz();
        q.start_time = Some(now + Duration::days(1));
        assert_eq!(can_attempt(&q, 3, now, 0), GateDecision::NotYetOpen);
        assert_eq!(can_attempt(&q, 3, now, 4), GateDecision::NotYetOpen);
        assert_eq!(can_attempt(&q, 0, now, 1), GateDecision::NotYetOpen);
    }

    #[test]
    fn test_past_end_is_closed() {
        let now = Utc::now();
        let mut q = quiz();
        q.start_time = Some(now - Duration::days(2));
        q.end_time = Some(now - Duration::seconds(1));
        assert_eq!(can_attempt(&q, 3, now, 0), GateDecision::Closed);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let now = Utc::now();
        let mut q = quiz();
        q.start_time = Some(now);
        q.end_time = Some(now);
        assert_eq!(can_attempt(&q, 1, now, 0), GateDecision::Allowed);
    }

    #[test]
    fn test_second_attempt_without_retakes() {
        assert_eq!(can_attempt(&quiz(), 3, Utc::now(), 1), GateDecision::AlreadyAttempted);
    }

    #[test]
    fn test_retakes_respect_attempt_limit() {
        let mut q = quiz();
        q.allow_retakes = true;
        q.attempt_limit = Some(2);
        assert_eq!(can_attempt(&q, 3, Utc::now(), 1), GateDecision::Allowed);
        assert_eq!(can_attempt(&q, 3, Utc::now(), 2), GateDecision::AlreadyAttempted);

        q.attempt_limit = None;
        assert_eq!(can_attempt(&q, 3, Utc::now(), 10), GateDecision::Allowed);
    }

    #[test]
    fn test_empty_quiz_has_no_questions() {
        assert_eq!(can_attempt(&quiz(), 0, Utc::now(), 0), GateDecision::NoQuestions);
    }
}
