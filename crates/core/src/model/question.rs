use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ClassId, QuestionId, SubjectId, TermId, TopicId};
use crate::model::selection::SelectionKey;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("duplicate option: {0:?}")]
    DuplicateOption(String),

    #[error("correct answer {0:?} is not one of the options")]
    CorrectAnswerNotAnOption(String),
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// A single answer option as it appears in content files.
///
/// Both `"Lagos"` and `{ "text": "Lagos" }` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OptionDraft {
    Plain(String),
    Labeled { text: String },
}

impl OptionDraft {
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            OptionDraft::Plain(text) | OptionDraft::Labeled { text } => text,
        }
    }
}

/// Unvalidated question as loaded from a content file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub class_id: ClassId,
    pub term_id: TermId,
    pub subject_id: SubjectId,
    pub topic_id: TopicId,
    #[serde(alias = "text")]
    pub question: String,
    pub options: Vec<OptionDraft>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub deep_explanation: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// Text, options and the correct answer are trimmed before checks.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is empty, fewer than two options
    /// are present, an option is empty or duplicated, or the correct answer is
    /// not among the options.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let text = self.question.trim().to_owned();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let mut options: Vec<String> = Vec::with_capacity(self.options.len());
        for (index, option) in self.options.into_iter().enumerate() {
            let option = option.into_text().trim().to_owned();
            if option.is_empty() {
                return Err(QuestionError::EmptyOption { index });
            }
            if options.contains(&option) {
                return Err(QuestionError::DuplicateOption(option));
            }
            options.push(option);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }

        let correct_answer = self.correct_answer.trim().to_owned();
        if !options.contains(&correct_answer) {
            return Err(QuestionError::CorrectAnswerNotAnOption(correct_answer));
        }

        let deep_explanation = self
            .deep_explanation
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());

        Ok(Question {
            id: self.id,
            class_id: self.class_id,
            term_id: self.term_id,
            subject_id: self.subject_id,
            topic_id: self.topic_id,
            text,
            options,
            correct_answer,
            explanation: self.explanation.trim().to_owned(),
            deep_explanation,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    class_id: ClassId,
    term_id: TermId,
    subject_id: SubjectId,
    topic_id: TopicId,
    #[serde(rename = "question")]
    text: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    deep_explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    #[must_use]
    pub fn term_id(&self) -> TermId {
        self.term_id
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    /// The selection key this question belongs to.
    #[must_use]
    pub fn selection_key(&self) -> SelectionKey {
        SelectionKey::new(self.class_id, self.term_id, self.subject_id, self.topic_id)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_answer == option
    }

    /// Short explanation shown right after answering.
    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn deep_explanation(&self) -> Option<&str> {
        self.deep_explanation.as_deref()
    }

    #[must_use]
    pub fn matches(&self, key: SelectionKey) -> bool {
        self.selection_key() == key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        serde_json::from_value(serde_json::json!({
            "id": "7",
            "classId": 1,
            "termId": 1,
            "subjectId": 2,
            "topicId": 5,
            "question": "  What is 2 + 2?  ",
            "options": ["3", { "text": "4" }, "5"],
            "correctAnswer": "4",
            "explanation": "Two plus two is four.",
            "deepExplanation": "   "
        }))
        .unwrap()
    }

    #[test]
    fn validate_normalizes_options_and_text() {
        let question = draft().validate().unwrap();
        assert_eq!(question.id(), QuestionId::new(7));
        assert_eq!(question.text(), "What is 2 + 2?");
        assert_eq!(question.options(), ["3", "4", "5"]);
        assert!(question.is_correct("4"));
        assert!(!question.is_correct("3"));
        assert_eq!(question.deep_explanation(), None);
        assert_eq!(
            question.selection_key(),
            SelectionKey::new(ClassId::new(1), TermId::new(1), SubjectId::new(2), TopicId::new(5))
        );
    }

    #[test]
    fn validate_rejects_empty_text() {
        let mut d = draft();
        d.question = "   ".into();
        assert_eq!(d.validate().unwrap_err(), QuestionError::EmptyText);
    }

    #[test]
    fn validate_rejects_unknown_correct_answer() {
        let mut d = draft();
        d.correct_answer = "22".into();
        assert!(matches!(
            d.validate().unwrap_err(),
            QuestionError::CorrectAnswerNotAnOption(answer) if answer == "22"
        ));
    }

    #[test]
    fn validate_rejects_single_or_duplicate_options() {
        let mut d = draft();
        d.options = vec![OptionDraft::Plain("4".into())];
        assert_eq!(d.validate().unwrap_err(), QuestionError::TooFewOptions(1));

        let mut d = draft();
        d.options.push(OptionDraft::Plain("4".into()));
        assert!(matches!(
            d.validate().unwrap_err(),
            QuestionError::DuplicateOption(_)
        ));
    }

    #[test]
    fn serializes_with_question_key() {
        let question = draft().validate().unwrap();
        let json = serde_json::to_value(&question).unwrap();
        assert_eq!(json["question"], "What is 2 + 2?");
        assert_eq!(json["correctAnswer"], "4");
        assert!(json.get("deepExplanation").is_none());
    }
}
