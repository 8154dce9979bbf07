use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use quiz_core::model::{Percentage, Question, QuestionId, Remark, SelectionKey, SoundEvent};

use super::progress::SessionProgress;
use crate::error::{ExplanationError, SessionError};
use crate::explanation::ExplanationRequest;

pub const CORRECT_MESSAGE: &str = "Hurray! You got it right! 🎉";
pub const WRONG_MESSAGE: &str = "Oops! Let's try again next time! 💪";

//
// ─── EXPLANATION STAGING ───────────────────────────────────────────────────────
//

/// How much explanation is visible for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ExplanationLevel {
    #[default]
    Hidden = 0,
    Basic = 1,
    Deep = 2,
}

impl ExplanationLevel {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Handle for one in-flight explanation fetch.
///
/// Only the most recent ticket for the current question is accepted back by
/// [`QuizSession::resolve_explanation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationTicket {
    question_id: QuestionId,
    token: u64,
    request: ExplanationRequest,
}

impl ExplanationTicket {
    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn token(&self) -> u64 {
        self.token
    }

    #[must_use]
    pub fn request(&self) -> &ExplanationRequest {
        &self.request
    }
}

/// Whether a fetch result was applied or dropped as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingFetch {
    question_id: QuestionId,
    token: u64,
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// Immediate feedback for a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: String,
    pub message: &'static str,
    /// Sound a front-end plays for this answer.
    pub cue: SoundEvent,
}

/// Record of one question once the learner moved past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredQuestion {
    pub question_id: QuestionId,
    /// `None` when the question was skipped.
    pub selected: Option<String>,
    pub correct: bool,
}

/// Outcome of [`QuizSession::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next,
    Completed,
}

/// Final tally of a completed quiz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub percentage: Percentage,
    pub remark: Remark,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One learner working through the questions of a selection.
///
/// Per question the session moves `unanswered → answered (basic) → answered
/// (deep)` and resets on [`advance`](Self::advance); advancing past the last
/// question completes it.
pub struct QuizSession {
    selection: SelectionKey,
    questions: Vec<Question>,
    current: usize,
    selected: Option<String>,
    score: u32,
    level: ExplanationLevel,
    answers: Vec<AnsweredQuestion>,
    fetched: HashMap<QuestionId, String>,
    pending: Option<PendingFetch>,
    fetch_error: Option<String>,
    next_token: u64,
    attempt_id: Uuid,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session over `questions`, in the order given.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn start(
        selection: SelectionKey,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            selection,
            questions,
            current: 0,
            selected: None,
            score: 0,
            level: ExplanationLevel::Hidden,
            answers: Vec::new(),
            fetched: HashMap::new(),
            pending: None,
            fetch_error: None,
            next_token: 0,
            attempt_id: Uuid::new_v4(),
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn selection(&self) -> SelectionKey {
        self.selection
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete() {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn explanation_level(&self) -> ExplanationLevel {
        self.level
    }

    #[must_use]
    pub fn answers(&self) -> &[AnsweredQuestion] {
        &self.answers
    }

    /// Identifier stored with the score so resubmissions are dropped.
    #[must_use]
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        SessionProgress {
            total,
            position: (self.current + 1).min(total),
            answered: self.answers.len() + usize::from(self.selected.is_some()),
            score: self.score,
            is_complete: self.is_complete(),
        }
    }

    /// Score, percentage and remark once the quiz is completed.
    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        if !self.is_complete() {
            return None;
        }
        let total = self.total_questions();
        let percentage = Percentage::from_score(self.score, total).ok()?;
        Some(QuizResult {
            score: self.score,
            total,
            percentage,
            remark: Remark::from_percentage(percentage.value()),
        })
    }

    fn active_question(&self) -> Result<&Question, SessionError> {
        self.current_question().ok_or(SessionError::Completed)
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Answer the current question.
    ///
    /// Returns `Ok(None)` if the question was already answered; the first
    /// answer stands.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after the last question, or
    /// `SessionError::UnknownOption` if `option` is not offered.
    pub fn submit_answer(&mut self, option: &str) -> Result<Option<AnswerFeedback>, SessionError> {
        let question = self.active_question()?;
        if self.selected.is_some() {
            return Ok(None);
        }
        if !question.has_option(option) {
            return Err(SessionError::UnknownOption(option.to_owned()));
        }

        let correct = question.is_correct(option);
        let feedback = AnswerFeedback {
            correct,
            correct_answer: question.correct_answer().to_owned(),
            message: if correct { CORRECT_MESSAGE } else { WRONG_MESSAGE },
            cue: if correct {
                SoundEvent::Correct
            } else {
                SoundEvent::Wrong
            },
        };

        if correct {
            self.score += 1;
        }
        self.selected = Some(option.to_owned());
        self.level = ExplanationLevel::Basic;
        Ok(Some(feedback))
    }

    /// Move to the next question, or complete the quiz after the last one.
    ///
    /// An unanswered question counts as skipped.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the quiz is already completed.
    pub fn advance(&mut self, at: DateTime<Utc>) -> Result<Advance, SessionError> {
        let question = self.active_question()?;
        let question_id = question.id();
        let correct = self
            .selected
            .as_deref()
            .is_some_and(|option| question.is_correct(option));
        let selected = self.selected.take();
        self.answers.push(AnsweredQuestion {
            question_id,
            selected,
            correct,
        });

        self.level = ExplanationLevel::Hidden;
        self.pending = None;
        self.fetch_error = None;

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            Ok(Advance::Next)
        } else {
            self.completed_at = Some(at);
            Ok(Advance::Completed)
        }
    }

    /// Reveal the basic explanation again after hiding it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAnswered` before an answer is submitted.
    pub fn show_basic_explanation(&mut self) -> Result<(), SessionError> {
        self.active_question()?;
        if self.selected.is_none() {
            return Err(SessionError::NotAnswered);
        }
        if self.level == ExplanationLevel::Hidden {
            self.level = ExplanationLevel::Basic;
        }
        Ok(())
    }

    /// Switch to the deep explanation.
    ///
    /// Returns a ticket when a fetch should be started. No ticket is issued if
    /// the explanation for this question is already cached or being fetched,
    /// or if the deep explanation is already showing. After a failed fetch a
    /// new request issues a fresh ticket.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ExplanationHidden` unless the basic explanation
    /// is visible.
    pub fn request_deeper_explanation(&mut self) -> Result<Option<ExplanationTicket>, SessionError> {
        let question = self.active_question()?;
        match self.level {
            ExplanationLevel::Hidden => return Err(SessionError::ExplanationHidden),
            // A failed fetch may be retried while the deep panel is open.
            ExplanationLevel::Deep if self.fetch_error.is_none() => return Ok(None),
            ExplanationLevel::Deep | ExplanationLevel::Basic => {}
        }

        let question_id = question.id();
        let request = ExplanationRequest::from_question(question);
        self.level = ExplanationLevel::Deep;

        if self.fetched.contains_key(&question_id)
            || self.pending.is_some_and(|p| p.question_id == question_id)
        {
            return Ok(None);
        }

        self.next_token += 1;
        self.fetch_error = None;
        self.pending = Some(PendingFetch {
            question_id,
            token: self.next_token,
        });
        Ok(Some(ExplanationTicket {
            question_id,
            token: self.next_token,
            request,
        }))
    }

    /// Apply a finished fetch.
    ///
    /// Results for a question the learner has moved past, or for a fetch that
    /// was superseded or cancelled, are dropped.
    pub fn resolve_explanation(
        &mut self,
        ticket: &ExplanationTicket,
        result: Result<String, ExplanationError>,
    ) -> Resolution {
        let expected = PendingFetch {
            question_id: ticket.question_id,
            token: ticket.token,
        };
        let is_current = self
            .current_question()
            .is_some_and(|q| q.id() == ticket.question_id);
        if self.pending != Some(expected) || !is_current {
            return Resolution::Stale;
        }

        self.pending = None;
        match result {
            Ok(text) => {
                self.fetched.insert(ticket.question_id, text);
                self.fetch_error = None;
            }
            Err(err) => self.fetch_error = Some(err.user_message()),
        }
        Resolution::Applied
    }

    /// Hide the explanation and forget the fetched text for this question.
    pub fn hide_explanation(&mut self) {
        let Some(question_id) = self.current_question().map(Question::id) else {
            return;
        };
        self.level = ExplanationLevel::Hidden;
        self.fetched.remove(&question_id);
        if self.pending.is_some_and(|p| p.question_id == question_id) {
            self.pending = None;
        }
        self.fetch_error = None;
    }

    //
    // ─── EXPLANATION TEXT ──────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn basic_explanation(&self) -> Option<&str> {
        if self.level >= ExplanationLevel::Basic {
            self.current_question().map(Question::explanation)
        } else {
            None
        }
    }

    /// Text for the deep explanation panel.
    ///
    /// The fetched text when present, else the question's own deep
    /// explanation, else the basic explanation.
    #[must_use]
    pub fn deep_explanation(&self) -> Option<&str> {
        if self.level != ExplanationLevel::Deep {
            return None;
        }
        let question = self.current_question()?;
        Some(
            self.fetched
                .get(&question.id())
                .map(String::as_str)
                .or_else(|| question.deep_explanation())
                .unwrap_or_else(|| question.explanation()),
        )
    }

    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.pending.is_some()
    }

    /// Message from the last failed fetch for the current question.
    #[must_use]
    pub fn explanation_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("selection", &self.selection)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("level", &self.level)
            .field("pending", &self.pending)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
