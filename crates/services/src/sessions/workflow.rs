use std::sync::Arc;

use quiz_core::model::{ScoreDraft, SelectionDraft};
use storage::repository::ScoreAppend;
use tracing::{debug, warn};

use super::service::{Advance, QuizSession, Resolution};
use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::error::{QuizError, SessionError};
use crate::explanation::ExplanationProvider;
use crate::scores::ScoreService;

/// Orchestrates quiz start, explanation fetches and result submission.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    catalog: Arc<CatalogService>,
    explanations: Arc<dyn ExplanationProvider>,
    scores: Arc<ScoreService>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<CatalogService>,
        explanations: Arc<dyn ExplanationProvider>,
        scores: Arc<ScoreService>,
    ) -> Self {
        Self {
            clock,
            catalog,
            explanations,
            scores,
        }
    }

    /// Start a quiz for a selection.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InputValidation` for a missing or malformed key and
    /// `QuizError::NotFound` when the selection has no questions.
    pub fn start(&self, draft: &SelectionDraft) -> Result<QuizSession, QuizError> {
        let key = draft.validate()?;
        let questions = self.catalog.questions_for(key)?;
        debug!(%key, questions = questions.len(), "starting quiz");
        Ok(QuizSession::start(key, questions, self.clock.now())?)
    }

    /// Advance using the service clock.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if the quiz is already completed.
    pub fn advance(&self, session: &mut QuizSession) -> Result<Advance, QuizError> {
        Ok(session.advance(self.clock.now())?)
    }

    /// Show the deep explanation, fetching it when needed.
    ///
    /// A failed fetch is recorded on the session and does not fail the call.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if the basic explanation is not showing.
    pub async fn deepen(&self, session: &mut QuizSession) -> Result<(), QuizError> {
        let Some(ticket) = session.request_deeper_explanation()? else {
            return Ok(());
        };

        let result = self.explanations.explain(ticket.request()).await;
        if let Err(err) = &result {
            warn!(
                provider = self.explanations.name(),
                question = %ticket.question_id(),
                error = %err,
                "explanation fetch failed"
            );
        }
        if session.resolve_explanation(&ticket, result) == Resolution::Stale {
            debug!(question = %ticket.question_id(), "dropped stale explanation");
        }
        Ok(())
    }

    /// Save the result of a completed quiz under `name`.
    ///
    /// Calling this again for the same session returns the stored entry.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if the quiz is not complete,
    /// `QuizError::InputValidation` for an empty name, or storage errors.
    pub async fn finish(&self, session: &QuizSession, name: &str) -> Result<ScoreAppend, QuizError> {
        if !session.is_complete() {
            return Err(SessionError::NotCompleted.into());
        }
        let selection = session.selection();
        let (subject_name, topic_name) = self.catalog.display_names(selection);
        let draft = ScoreDraft {
            name: name.to_owned(),
            selection,
            subject_name,
            topic_name,
            score: session.score(),
            total_questions: session.total_questions(),
            date: session.completed_at().unwrap_or_else(|| self.clock.now()),
            attempt_id: Some(session.attempt_id()),
        };
        self.scores.submit(draft).await
    }
}
