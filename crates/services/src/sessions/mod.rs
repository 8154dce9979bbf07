mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::{
    Advance, AnswerFeedback, AnsweredQuestion, CORRECT_MESSAGE, ExplanationLevel,
    ExplanationTicket, QuizResult, QuizSession, Resolution, WRONG_MESSAGE,
};
pub use workflow::QuizLoopService;
