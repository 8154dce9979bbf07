//! HTTP error mapping. Every failure leaves the server as JSON `{ "error": ... }`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use services::{ExplanationError, QuizError};
use storage::repository::StorageError;
use thiserror::Error;
use tracing::error;

const GENERATE_FAILED: &str = "Failed to generate explanation. Please try again.";
const ASK_UNAVAILABLE: &str = "AI service unavailable";
pub(crate) const INVALID_QUESTION: &str = "Invalid question format";
const TIMED_OUT: &str = "Request timed out";
const INTERNAL: &str = "Internal server error";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Mapping for `POST /api/generate-explanation`.
    #[must_use]
    pub fn explanation(err: &ExplanationError) -> Self {
        match err {
            _ if err.is_input_error() => AppError::BadRequest(err.user_message()),
            ExplanationError::Disabled => AppError::ServiceUnavailable(err.user_message()),
            _ => AppError::Internal(GENERATE_FAILED.into()),
        }
    }

    /// Mapping for `POST /api/ask`: provider statuses pass through.
    #[must_use]
    pub fn ask(err: ExplanationError) -> Self {
        match err {
            ExplanationError::InvalidQuestion => AppError::BadRequest(INVALID_QUESTION.into()),
            ExplanationError::Timeout => AppError::Status {
                status: StatusCode::GATEWAY_TIMEOUT,
                message: TIMED_OUT.into(),
            },
            ExplanationError::Upstream { status, message } => AppError::Status {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message: message.unwrap_or_else(|| ASK_UNAVAILABLE.into()),
            },
            ExplanationError::Disabled => AppError::ServiceUnavailable(ASK_UNAVAILABLE.into()),
            _ => AppError::Internal(ASK_UNAVAILABLE.into()),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Status { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::InputValidation(message) => AppError::BadRequest(message),
            QuizError::NotFound(message) => AppError::NotFound(message),
            QuizError::ServiceUnavailable(message) => AppError::ServiceUnavailable(message),
            QuizError::Session(err) => AppError::BadRequest(err.to_string()),
            QuizError::Storage(err) => err.into(),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => AppError::NotFound("Not found".into()),
            other => {
                error!(error = %other, "storage failure");
                AppError::Internal(INTERNAL.into())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Status {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
