use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ExplanationProvider;
use super::request::{ExplanationRequest, build_prompt};
use crate::error::ExplanationError;

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_MODEL: &str = "gpt2";
const MAX_QUESTION_CHARS: usize = 2000;
pub const FALLBACK_ANSWER: &str = "I'm still learning! Try asking again later.";

#[derive(Clone, Debug)]
pub struct AskConfig {
    pub base_url: String,
    pub token: String,
    pub model: String,
    pub timeout: Duration,
}

impl AskConfig {
    /// Read `HUGGING_FACE_TOKEN` (or `VITE_HUGGING_FACE_TOKEN`),
    /// `QUIZ_ASK_BASE_URL` and `QUIZ_ASK_MODEL`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let token = env::var("HUGGING_FACE_TOKEN")
            .or_else(|_| env::var("VITE_HUGGING_FACE_TOKEN"))
            .ok()
            .filter(|token| !token.trim().is_empty())?;
        let base_url = env::var("QUIZ_ASK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("QUIZ_ASK_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Some(Self::new(base_url, token, model))
    }

    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            model: model.into(),
            timeout: Duration::from_secs(20),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Free-form questions answered by a text-generation inference endpoint.
#[derive(Clone)]
pub struct AskService {
    client: Client,
    config: Option<AskConfig>,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InferenceError {
    error: Option<String>,
}

impl AskService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(AskConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<AskConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Answer a learner's question.
    ///
    /// # Errors
    ///
    /// Returns `ExplanationError::InvalidQuestion` for empty or over-long
    /// questions, `Upstream` with the provider's status and message for
    /// non-2xx responses, `Timeout` after the configured deadline, and
    /// `Disabled` when no token is configured.
    pub async fn ask(&self, question: &str) -> Result<String, ExplanationError> {
        if question.is_empty() || question.chars().count() > MAX_QUESTION_CHARS {
            return Err(ExplanationError::InvalidQuestion);
        }
        let config = self.config.as_ref().ok_or(ExplanationError::Disabled)?;

        let url = format!(
            "{}/models/{}",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&config.token)
            .timeout(config.timeout)
            .json(&InferenceRequest { inputs: question })
            .send()
            .await
            .inspect_err(|err| warn!(error = %err, "ask request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<InferenceError>()
                .await
                .ok()
                .and_then(|body| body.error);
            warn!(status = status.as_u16(), ?message, "ask provider returned an error");
            return Err(ExplanationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let generations: Vec<Generation> = response.json().await?;
        let raw = generations
            .into_iter()
            .next()
            .and_then(|generation| generation.generated_text)
            .filter(|text| !text.is_empty());
        Ok(match raw {
            Some(raw) => clean_answer(&raw, question),
            None => FALLBACK_ANSWER.to_owned(),
        })
    }
}

/// Strip the echoed question and any trailing unfinished sentence.
///
/// Text-generation models repeat the prompt before continuing it. An answer
/// with no complete sentence left becomes the fallback text.
#[must_use]
pub fn clean_answer(raw: &str, question: &str) -> String {
    let mut answer = raw;
    if let Some(index) = answer.find(question) {
        answer = &answer[index + question.len()..];
    }
    let answer = answer.trim();
    let complete = answer
        .rfind(['.', '!', '?'])
        .map_or("", |end| &answer[..=end])
        .trim();
    if complete.is_empty() {
        FALLBACK_ANSWER.to_owned()
    } else {
        complete.to_owned()
    }
}

#[async_trait]
impl ExplanationProvider for AskService {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationError> {
        request.validate()?;
        let prompt: String = build_prompt(request).chars().take(MAX_QUESTION_CHARS).collect();
        self.ask(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_answer_drops_echo_and_fragment() {
        let cleaned = clean_answer(
            "Why is the sky blue? Light scatters. Blue light scatters most and",
            "Why is the sky blue?",
        );
        assert_eq!(cleaned, "Light scatters.");
    }

    #[test]
    fn clean_answer_keeps_complete_text() {
        assert_eq!(clean_answer("It rains! Really?", "Q"), "It rains! Really?");
        assert_eq!(clean_answer("no full stop here", "Q"), FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn rejects_bad_questions_before_network() {
        let service = AskService::new(Some(AskConfig::new("http://127.0.0.1:9", "t", "m")));
        assert!(matches!(
            service.ask("").await,
            Err(ExplanationError::InvalidQuestion)
        ));
        let long = "a".repeat(2001);
        assert!(matches!(
            service.ask(&long).await,
            Err(ExplanationError::InvalidQuestion)
        ));
    }

    #[tokio::test]
    async fn disabled_without_token() {
        let service = AskService::new(None);
        assert!(matches!(
            service.ask("What is rain?").await,
            Err(ExplanationError::Disabled)
        ));
    }
}
