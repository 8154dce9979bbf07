//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{ScoreError, SelectionError, SoundPreferencesError};
use storage::content::ContentError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by explanation and ask providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExplanationError {
    #[error("explanation provider is not configured")]
    Disabled,
    #[error("question text is required")]
    MissingQuestion,
    #[error("correct answer is required")]
    MissingCorrectAnswer,
    #[error("Invalid question format")]
    InvalidQuestion,
    #[error("Request timed out")]
    Timeout,
    #[error("provider returned status {status}")]
    Upstream { status: u16, message: Option<String> },
    #[error("provider returned an empty response")]
    EmptyResponse,
    #[error(transparent)]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for ExplanationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExplanationError::Timeout
        } else {
            ExplanationError::Http(err)
        }
    }
}

impl ExplanationError {
    /// Text shown next to the question when a fetch fails.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ExplanationError::Disabled => "AI explanations are not available right now.".into(),
            ExplanationError::Timeout => "Request timed out".into(),
            ExplanationError::MissingQuestion | ExplanationError::MissingCorrectAnswer => {
                "Question and correct answer are required.".into()
            }
            ExplanationError::InvalidQuestion => self.to_string(),
            ExplanationError::Upstream { .. }
            | ExplanationError::EmptyResponse
            | ExplanationError::Http(_) => {
                "Failed to generate explanation. Please try again.".into()
            }
        }
    }

    /// Whether the caller sent bad input, as opposed to the provider failing.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ExplanationError::MissingQuestion
                | ExplanationError::MissingCorrectAnswer
                | ExplanationError::InvalidQuestion
        )
    }
}

/// Errors emitted by the quiz session state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for this selection")]
    Empty,
    #[error("quiz already completed")]
    Completed,
    #[error("quiz is not completed yet")]
    NotCompleted,
    #[error("answer the question first")]
    NotAnswered,
    #[error("open the basic explanation first")]
    ExplanationHidden,
    #[error("{0:?} is not an option for this question")]
    UnknownOption(String),
}

/// Error taxonomy surfaced to the HTTP layer and the terminal quiz.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    /// Bad input, rejected before any network call.
    #[error("{0}")]
    InputValidation(String),
    /// A remote provider failed; quiz progress is not blocked.
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<SelectionError> for QuizError {
    fn from(err: SelectionError) -> Self {
        QuizError::InputValidation(err.to_string())
    }
}

impl From<ScoreError> for QuizError {
    fn from(err: ScoreError) -> Self {
        QuizError::InputValidation(err.to_string())
    }
}

impl From<SoundPreferencesError> for QuizError {
    fn from(err: SoundPreferencesError) -> Self {
        QuizError::InputValidation(err.to_string())
    }
}

impl From<ExplanationError> for QuizError {
    fn from(err: ExplanationError) -> Self {
        if err.is_input_error() {
            QuizError::InputValidation(err.user_message())
        } else {
            QuizError::ServiceUnavailable(err.user_message())
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Content(#[from] ContentError),
}
