#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod explanation;
pub mod scores;
pub mod sessions;
pub mod sound_settings_service;

pub use quiz_core::Clock;

pub use app_services::{AppServices, Providers};
pub use catalog_service::CatalogService;
pub use error::{AppServicesError, ExplanationError, QuizError, SessionError};
pub use explanation::{
    AskConfig, AskService, ExplanationProvider, ExplanationRequest, GenerativeConfig,
    GenerativeExplanationService, RemoteExplanationClient,
};
pub use scores::{ScoreService, Scoreboard};
pub use sessions::{
    AnswerFeedback, ExplanationLevel, ExplanationTicket, QuizLoopService, QuizResult, QuizSession,
    SessionProgress,
};
pub use sound_settings_service::SoundSettingsService;
