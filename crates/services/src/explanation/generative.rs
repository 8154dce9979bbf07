use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::request::{ExplanationRequest, build_prompt};
use super::ExplanationProvider;
use crate::error::ExplanationError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct GenerativeConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl GenerativeConfig {
    /// Read `GOOGLE_API_KEY`, `QUIZ_AI_BASE_URL` and `QUIZ_AI_MODEL`.
    ///
    /// Returns `None` when no key is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("GOOGLE_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("QUIZ_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("QUIZ_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Some(Self::new(base_url, api_key, model))
    }

    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Explanations from the Google Generative Language API.
#[derive(Clone)]
pub struct GenerativeExplanationService {
    client: Client,
    config: Option<GenerativeConfig>,
}

impl GenerativeExplanationService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GenerativeConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GenerativeConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Send a prompt and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns `ExplanationError` when the service is disabled, the request
    /// fails or times out, or the response carries no text.
    pub async fn generate(&self, prompt: &str) -> Result<String, ExplanationError> {
        let config = self.config.as_ref().ok_or(ExplanationError::Disabled)?;

        let url = format!(
            "{}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        let payload = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &config.api_key)
            .timeout(config.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .map(|error| error.message);
            return Err(ExplanationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(ExplanationError::EmptyResponse);
        }
        Ok(text.to_owned())
    }
}

#[async_trait]
impl ExplanationProvider for GenerativeExplanationService {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationError> {
        request.validate()?;
        let prompt = build_prompt(request);
        debug!(%prompt, "sending explanation prompt");
        self.generate(&prompt).await.inspect_err(|err| {
            warn!(error = %err, "explanation request failed");
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_without_key() {
        let service = GenerativeExplanationService::new(None);
        assert!(!service.enabled());
        let request = ExplanationRequest::new("2 + 2?", vec!["4".into()], "4");
        assert!(matches!(
            service.explain(&request).await,
            Err(ExplanationError::Disabled)
        ));
    }

    #[tokio::test]
    async fn validates_before_calling_out() {
        let config = GenerativeConfig::new("http://127.0.0.1:9", "key", "model");
        let service = GenerativeExplanationService::new(Some(config));
        let request = ExplanationRequest::new("  ", Vec::new(), "4");
        assert!(matches!(
            service.explain(&request).await,
            Err(ExplanationError::MissingQuestion)
        ));
    }

    #[test]
    fn response_text_parts_are_joined() {
        let body: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Four " }, { "text": "items." }] } }]
        }))
        .unwrap();
        let joined: String = body.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        assert_eq!(joined, "Four items.");
    }
}
