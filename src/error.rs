// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::{answer_key::AnswerKeyError, gate::GateDecision, recorder::SubmitError};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden (e.g., quiz window closed)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., quiz already submitted)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Maps a refused scheduling check to the message shown to the student.
impl From<GateDecision> for AppError {
    fn from(decision: GateDecision) -> Self {
        let message = decision.message().to_string();
        match decision {
            GateDecision::NotYetOpen | GateDecision::Closed => AppError::Forbidden(message),
            GateDecision::AlreadyAttempted => AppError::Conflict(message),
            GateDecision::NoQuestions => AppError::BadRequest(message),
            GateDecision::Allowed => {
                AppError::InternalServerError("Allowed gate decision treated as an error".to_string())
            }
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::QuizNotFound => AppError::NotFound("Quiz not found".to_string()),
            SubmitError::Denied(decision) => decision.into(),
            SubmitError::AlreadySubmitted => {
                AppError::Conflict("You have already submitted this quiz.".to_string())
            }
            SubmitError::Persistence(e) => {
                tracing::error!("Failed to record submission: {:?}", e);
                AppError::InternalServerError(e.to_string())
            }
        }
    }
}

impl From<AnswerKeyError> for AppError {
    fn from(err: AnswerKeyError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
