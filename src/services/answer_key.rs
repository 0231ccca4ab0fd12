// src/services/answer_key.rs

//! Answer keys.
//!
//! Questions store their key as text. Canonically that text is the resolved
//! option text (comma-joined for multiselect) or a decimal integer. Older rows
//! may still reference option slots with `optionN` tokens; those are resolved
//! here so grading never has to sniff formats, and rewritten by
//! [`migrate_legacy_keys`] at startup.

use std::{
    collections::BTreeSet,
    fmt,
    sync::LazyLock,
};

use regex::Regex;
use sqlx::SqlitePool;

use crate::models::question::{Question, QuestionType};

/// Matches index tokens such as `option2` or `Option 4`.
static OPTION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^option\s*([1-6])$").expect("option token pattern is valid")
});

/// Typed answer key, built once per question before grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKey {
    /// Single choice and true/false. Normalized text.
    Single(String),
    /// Multiselect. Normalized texts.
    Multi(BTreeSet<String>),
    Integer(i64),
    /// Unknown question type or an unreadable key. Never matches.
    Unsupported,
}

impl AnswerKey {
    pub fn from_question(question: &Question) -> Self {
        let slots = question.options();
        match question.kind() {
            QuestionType::Single | QuestionType::TrueFalse => {
                let text = normalize(resolve_token(&question.correct_option, &slots));
                if text.is_empty() {
                    AnswerKey::Unsupported
                } else {
                    AnswerKey::Single(text)
                }
            }
            QuestionType::MultiSelect => AnswerKey::Multi(
                split_tokens(&question.correct_option)
                    .map(|token| normalize(resolve_token(token, &slots)))
                    .collect(),
            ),
            QuestionType::Integer => match question.correct_option.trim().parse::<i64>() {
                Ok(value) => AnswerKey::Integer(value),
                Err(_) => AnswerKey::Unsupported,
            },
            QuestionType::Unknown => AnswerKey::Unsupported,
        }
    }
}

/// Trim and case-fold.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Splits a comma-joined answer into trimmed, non-empty tokens.
pub fn split_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Returns the slot number referenced by an `optionN` token.
fn option_slot(token: &str) -> Option<usize> {
    OPTION_TOKEN
        .captures(token.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Resolves an `optionN` token to the slot's text. Anything else, including a
/// token naming an empty slot, is returned unchanged.
pub fn resolve_token<'a>(token: &'a str, slots: &[(usize, &'a str)]) -> &'a str {
    match option_slot(token) {
        Some(slot) => slots
            .iter()
            .find(|(n, _)| *n == slot)
            .map(|(_, text)| *text)
            .unwrap_or(token),
        None => token,
    }
}

/// Write-time validation failures for an answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKeyError {
    UnknownType,
    Empty,
    NotAnInteger(String),
    NotBoolean(String),
    /// Token references an empty option slot or text that is not among the options.
    UnknownOption(String),
    /// Multiselect option texts are comma-joined in storage.
    CommaInOption(String),
}

impl fmt::Display for AnswerKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerKeyError::UnknownType => write!(f, "Unsupported question type"),
            AnswerKeyError::Empty => write!(f, "Correct answer cannot be empty"),
            AnswerKeyError::NotAnInteger(v) => write!(f, "'{}' is not an integer", v),
            AnswerKeyError::NotBoolean(v) => write!(f, "'{}' is not true or false", v),
            AnswerKeyError::UnknownOption(v) => write!(f, "'{}' does not match any option", v),
            AnswerKeyError::CommaInOption(v) => {
                write!(f, "Option '{}' contains a comma and cannot be a multiselect answer", v)
            }
        }
    }
}

impl std::error::Error for AnswerKeyError {}

/// Produces the canonical stored form of an answer key.
///
/// `slots` are the question's filled option slots as `(slot number, text)`.
pub fn canonicalize(
    kind: QuestionType,
    raw: &str,
    slots: &[(usize, &str)],
) -> Result<String, AnswerKeyError> {
    match kind {
        QuestionType::Single => canonical_choice(raw.trim(), slots),
        QuestionType::TrueFalse => {
            let value = canonical_choice(raw.trim(), slots)?;
            match normalize(&value).as_str() {
                "true" | "false" => Ok(value),
                _ => Err(AnswerKeyError::NotBoolean(value)),
            }
        }
        QuestionType::MultiSelect => {
            let mut seen = BTreeSet::new();
            let mut picked = Vec::new();
            for token in split_tokens(raw) {
                let value = canonical_choice(token, slots)?;
                if value.contains(',') {
                    return Err(AnswerKeyError::CommaInOption(value));
                }
                if seen.insert(normalize(&value)) {
                    picked.push(value);
                }
            }
            if picked.is_empty() {
                return Err(AnswerKeyError::Empty);
            }
            Ok(picked.join(","))
        }
        QuestionType::Integer => {
            let trimmed = raw.trim();
            trimmed
                .parse::<i64>()
                .map(|v| v.to_string())
                .map_err(|_| AnswerKeyError::NotAnInteger(trimmed.to_string()))
        }
        QuestionType::Unknown => Err(AnswerKeyError::UnknownType),
    }
}

/// Resolves one choice token to option text. When the question has options,
/// the result must name one of them and takes the option's own spelling.
fn canonical_choice(token: &str, slots: &[(usize, &str)]) -> Result<String, AnswerKeyError> {
    if token.is_empty() {
        return Err(AnswerKeyError::Empty);
    }
    if let Some(slot) = option_slot(token) {
        return slots
            .iter()
            .find(|(n, _)| *n == slot)
            .map(|(_, text)| text.trim().to_string())
            .ok_or_else(|| AnswerKeyError::UnknownOption(token.to_string()));
    }
    if slots.is_empty() {
        return Ok(token.to_string());
    }
    let wanted = normalize(token);
    slots
        .iter()
        .find(|(_, text)| normalize(text) == wanted)
        .map(|(_, text)| text.trim().to_string())
        .ok_or_else(|| AnswerKeyError::UnknownOption(token.to_string()))
}

fn has_index_tokens(raw: &str) -> bool {
    split_tokens(raw).any(|token| option_slot(token).is_some())
}

/// Rewrites answer keys that still hold `optionN` tokens into canonical text.
/// Rows that cannot be resolved are left untouched and logged.
/// Returns the number of rewritten rows.
pub async fn migrate_legacy_keys(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let questions: Vec<Question> = sqlx::query_as("SELECT * FROM questions ORDER BY id")
        .fetch_all(pool)
        .await?;

    let mut rewrites = Vec::new();
    for question in &questions {
        if !has_index_tokens(&question.correct_option) {
            continue;
        }
        match canonicalize(question.kind(), &question.correct_option, &question.options()) {
            Ok(canonical) if canonical != question.correct_option => {
                rewrites.push((question.id, canonical));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    "Question {} keeps legacy answer key '{}': {}",
                    question.id,
                    question.correct_option,
                    e
                );
            }
        }
    }

    if rewrites.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for (id, canonical) in &rewrites {
        sqlx::query("UPDATE questions SET correct_option = ? WHERE id = ?")
            .bind(canonical)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::info!("Rewrote {} legacy answer keys", rewrites.len());
    Ok(rewrites.len() as u64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Question fixture shared by the service tests.
    pub(crate) fn question(id: i64, kind: &str, options: &[&str], correct: &str, marks: i64) -> Question {
        let slot = |i: usize| options.get(i).map(|s| s.to_string());
        Question {
            id,
            quiz_id: 1,
            question_statement: format!("Question {}", id),
            option1: slot(0),
            option2: slot(1),
            option3: slot(2),
            option4: slot(3),
            option5: slot(4),
            option6: slot(5),
            question_type: kind.to_string(),
            correct_option: correct.to_string(),
            marks,
            difficulty: "Medium".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_single_key_resolves_index_token() {
        let q = question(1, "single", &["Paris", "Rome", "Oslo"], "option2", 1);
        assert_eq!(AnswerKey::from_question(&q), AnswerKey::Single("rome".to_string()));
    }

    #[test]
    fn test_single_key_keeps_literal_text() {
        let q = question(1, "single", &["A", "B"], " B ", 1);
        assert_eq!(AnswerKey::from_question(&q), AnswerKey::Single("b".to_string()));
    }

    #[test]
    fn test_multi_key_mixes_tokens_and_text() {
        let q = question(1, "multiselect", &["X", "Y", "Z"], "option1, y", 2);
        let expected: BTreeSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        assert_eq!(AnswerKey::from_question(&q), AnswerKey::Multi(expected));
    }

    #[test]
    fn test_integer_key_and_unreadable_keys() {
        let q = question(1, "integer", &[], " 42 ", 1);
        assert_eq!(AnswerKey::from_question(&q), AnswerKey::Integer(42));

        let bad = question(2, "integer", &[], "forty-two", 1);
        assert_eq!(AnswerKey::from_question(&bad), AnswerKey::Unsupported);

        let unknown = question(3, "essay", &[], "anything", 1);
        assert_eq!(AnswerKey::from_question(&unknown), AnswerKey::Unsupported);
    }

    #[test]
    fn test_token_naming_empty_slot_is_left_alone() {
        let slots = [(1, "Yes"), (2, "No")];
        assert_eq!(resolve_token("option5", &slots), "option5");
        assert_eq!(resolve_token("Option 2", &slots), "No");
    }

    #[test]
    fn test_canonicalize_choice_questions() {
        let slots = [(1, "Paris"), (2, "Rome")];
        assert_eq!(canonicalize(QuestionType::Single, "option1", &slots), Ok("Paris".to_string()));
        assert_eq!(canonicalize(QuestionType::Single, " rome ", &slots), Ok("Rome".to_string()));
        assert_eq!(
            canonicalize(QuestionType::Single, "Berlin", &slots),
            Err(AnswerKeyError::UnknownOption("Berlin".to_string()))
        );
        assert_eq!(
            canonicalize(QuestionType::Single, "option4", &slots),
            Err(AnswerKeyError::UnknownOption("option4".to_string()))
        );
    }

    #[test]
    fn test_canonicalize_multiselect_dedupes_and_rejects_commas() {
        let slots = [(1, "X"), (2, "Y"), (3, "a, b")];
        assert_eq!(
            canonicalize(QuestionType::MultiSelect, "option1,Y,x", &slots),
            Ok("X,Y".to_string())
        );
        assert_eq!(
            canonicalize(QuestionType::MultiSelect, "option3", &slots),
            Err(AnswerKeyError::CommaInOption("a, b".to_string()))
        );
        assert_eq!(canonicalize(QuestionType::MultiSelect, " , ", &slots), Err(AnswerKeyError::Empty));
    }

    #[test]
    fn test_canonicalize_integer_and_true_false() {
        assert_eq!(canonicalize(QuestionType::Integer, " 007 ", &[]), Ok("7".to_string()));
        assert!(matches!(
            canonicalize(QuestionType::Integer, "seven", &[]),
            Err(AnswerKeyError::NotAnInteger(_))
        ));
        assert_eq!(canonicalize(QuestionType::TrueFalse, "True", &[]), Ok("True".to_string()));
        assert!(matches!(
            canonicalize(QuestionType::TrueFalse, "maybe", &[]),
            Err(AnswerKeyError::NotBoolean(_))
        ));
        assert!(matches!(
            canonicalize(QuestionType::Unknown, "x", &[]),
            Err(AnswerKeyError::UnknownType)
        ));
    }
}
