use quiz_core::model::{OptionDraft, Question};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ExplanationError;

/// Input for an explanation fetch.
///
/// The JSON shape is the browser contract of `/api/generate-explanation`:
/// `{ "question", "options": [{ "text" }], "correctAnswer" }`. Options may
/// also arrive as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationRequest {
    #[serde(default)]
    pub question: String,
    #[serde(
        default,
        serialize_with = "serialize_options",
        deserialize_with = "deserialize_options"
    )]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: String,
}

impl ExplanationRequest {
    #[must_use]
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            options,
            correct_answer: correct_answer.into(),
        }
    }

    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self::new(
            question.text(),
            question.options().to_vec(),
            question.correct_answer(),
        )
    }

    /// Check the fields every provider needs.
    ///
    /// # Errors
    ///
    /// Returns `ExplanationError::MissingQuestion` or
    /// `ExplanationError::MissingCorrectAnswer` for blank fields.
    pub fn validate(&self) -> Result<(), ExplanationError> {
        if self.question.trim().is_empty() {
            return Err(ExplanationError::MissingQuestion);
        }
        if self.correct_answer.trim().is_empty() {
            return Err(ExplanationError::MissingCorrectAnswer);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct LabeledOption<'a> {
    text: &'a str,
}

fn serialize_options<S: Serializer>(options: &[String], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(options.iter().map(|text| LabeledOption { text }))
}

fn deserialize_options<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Vec<OptionDraft>>::deserialize(d)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(OptionDraft::into_text)
        .collect())
}

/// Prompt sent to generative providers.
#[must_use]
pub fn build_prompt(request: &ExplanationRequest) -> String {
    let mut prompt = String::from(
        "Provide a concise, clear, and educational explanation for the following quiz \
         question and its correct answer. Focus on why the correct answer is correct and \
         briefly explain why others are not if relevant. Keep it under 150 words.\n\n",
    );
    prompt.push_str(&format!("Question: {}\n", request.question.trim()));
    if !request.options.is_empty() {
        prompt.push_str(&format!("Options: {}\n", request.options.join(", ")));
    }
    prompt.push_str(&format!(
        "Correct Answer: {}\n\nExplanation:",
        request.correct_answer.trim()
    ));
    prompt
}
