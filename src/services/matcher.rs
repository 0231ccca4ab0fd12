// src/services/matcher.rs

use std::collections::BTreeSet;

use crate::{
    models::question::Question,
    services::answer_key::{AnswerKey, normalize, resolve_token, split_tokens},
};

/// An answer as received from the client.
///
/// Choice fields may arrive repeated (one value per ticked box) or as one
/// comma-joined value; both shapes are kept as-is and interpreted per question type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmittedAnswer {
    values: Vec<String>,
}

impl SubmittedAnswer {
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values
            .into_iter()
            .map(Into::into)
            .filter(|v: &String| !v.trim().is_empty())
            .collect();
        SubmittedAnswer { values }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_values([text.into()])
    }

    pub fn push(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.values.push(value);
        }
    }

    /// Nothing (or only whitespace) was submitted.
    pub fn is_blank(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored representation: values comma-joined.
    pub fn raw(&self) -> String {
        self.values
            .iter()
            .map(|v| v.trim())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn first(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    fn tokens(&self) -> impl Iterator<Item = &str> {
        self.values.iter().flat_map(|v| split_tokens(v))
    }
}

/// Result of grading one answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// True only for full credit.
    pub is_correct: bool,
    pub marks_awarded: f64,
}

impl Evaluation {
    const WRONG: Evaluation = Evaluation {
        is_correct: false,
        marks_awarded: 0.0,
    };

    fn full(marks: f64) -> Self {
        Evaluation {
            is_correct: true,
            marks_awarded: marks,
        }
    }
}

/// Grades a submitted answer against the question's key.
pub fn evaluate(question: &Question, answer: &SubmittedAnswer) -> Evaluation {
    let key = AnswerKey::from_question(question);
    let marks = question.marks.max(0) as f64;
    let slots = question.options();

    match &key {
        AnswerKey::Single(expected) => match answer.first() {
            Some(given) if normalize(resolve_token(given, &slots)) == *expected => {
                Evaluation::full(marks)
            }
            _ => Evaluation::WRONG,
        },
        AnswerKey::Integer(expected) => match answer.first().map(|v| v.trim().parse::<i64>()) {
            Some(Ok(given)) if given == *expected => Evaluation::full(marks),
            _ => Evaluation::WRONG,
        },
        AnswerKey::Multi(correct) => {
            let selected: BTreeSet<String> = answer
                .tokens()
                .map(|token| normalize(resolve_token(token, &slots)))
                .collect();
            grade_selection(correct, &selected, marks)
        }
        AnswerKey::Unsupported => Evaluation::WRONG,
    }
}

/// Partial credit for multiselect: full marks on an exact match, otherwise
/// `marks * |correct ∩ selected| / |correct|`, bounded to `[0, marks]`.
pub fn grade_selection(
    correct: &BTreeSet<String>,
    selected: &BTreeSet<String>,
    marks: f64,
) -> Evaluation {
    if correct.is_empty() {
        return Evaluation::WRONG;
    }
    if correct == selected {
        return Evaluation::full(marks);
    }
    let hits = correct.intersection(selected).count() as f64;
    let awarded = marks * hits / correct.len() as f64;
    Evaluation {
        is_correct: false,
        marks_awarded: awarded.clamp(0.0, marks),
    }
}
