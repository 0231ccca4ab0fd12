// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use url::Url;
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub question_statement: String,

    /// Option slots. Only the first two are mandatory for choice questions.
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub option4: Option<String>,
    pub option5: Option<String>,
    pub option6: Option<String>,

    /// 'single', 'multiselect', 'integer' or 'true_false'.
    pub question_type: String,

    /// Answer key. Canonically the resolved option text (comma-joined for
    /// multiselect) or a decimal integer; older rows may still hold `optionN` tokens.
    pub correct_option: String,

    pub marks: i64,

    /// 'Easy', 'Medium' or 'Hard'.
    pub difficulty: String,

    pub image_url: Option<String>,
}

impl Question {
    /// Filled option slots as `(slot number, text)`, slot numbers starting at 1.
    pub fn options(&self) -> Vec<(usize, &str)> {
        [
            &self.option1,
            &self.option2,
            &self.option3,
            &self.option4,
            &self.option5,
            &self.option6,
        ]
        .into_iter()
        .enumerate()
        .filter_map(|(i, slot)| slot.as_deref().map(|text| (i + 1, text)))
        .collect()
    }

    pub fn kind(&self) -> QuestionType {
        QuestionType::parse(&self.question_type)
    }
}

/// Question type as understood by the answer matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    Single,
    MultiSelect,
    Integer,
    TrueFalse,
    /// Anything else found in storage. Always graded as wrong.
    Unknown,
}

impl QuestionType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => QuestionType::Single,
            "multiselect" | "multiple" => QuestionType::MultiSelect,
            "integer" => QuestionType::Integer,
            "true_false" | "truefalse" => QuestionType::TrueFalse,
            _ => QuestionType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::MultiSelect => "multiselect",
            QuestionType::Integer => "integer",
            QuestionType::TrueFalse => "true_false",
            QuestionType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty buckets, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// DTO for sending a question to a student (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: String,
    pub statement: String,
    pub options: Vec<String>,
    pub marks: i64,
    pub difficulty: String,
    pub image_url: Option<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        let options = q.options().into_iter().map(|(_, text)| text.to_string()).collect();
        PublicQuestion {
            id: q.id,
            question_type: q.question_type,
            statement: q.question_statement,
            options,
            marks: q.marks,
            difficulty: q.difficulty,
            image_url: q.image_url,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question_statement: String,
    #[validate(custom(function = validate_options))]
    #[serde(default)]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 20))]
    pub question_type: String,
    /// Either option text or `optionN` tokens; resolved before storage.
    #[validate(length(min = 1, max = 500))]
    pub correct_option: String,
    #[validate(range(min = 1, max = 100))]
    pub marks: i64,
    #[validate(custom(function = validate_difficulty))]
    pub difficulty: String,
    #[validate(custom(function = validate_image_url))]
    pub image_url: Option<String>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() > crate::config::MAX_OPTIONS {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 255 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

fn validate_difficulty(difficulty: &str) -> Result<(), validator::ValidationError> {
    match Difficulty::parse(difficulty) {
        Some(_) => Ok(()),
        None => Err(validator::ValidationError::new("unknown_difficulty")),
    }
}

fn validate_image_url(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_image_url"));
    }
    Ok(())
}
