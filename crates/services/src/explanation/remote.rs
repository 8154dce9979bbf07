use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::ExplanationProvider;
use super::request::ExplanationRequest;
use crate::error::ExplanationError;

/// Calls `POST /api/generate-explanation` on a running quiz server.
#[derive(Clone)]
pub struct RemoteExplanationClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ExplanationBody {
    explanation: Option<String>,
    error: Option<String>,
}

impl RemoteExplanationClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ExplanationProvider for RemoteExplanationClient {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn enabled(&self) -> bool {
        !self.base_url.trim().is_empty()
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationError> {
        request.validate()?;
        if !self.enabled() {
            return Err(ExplanationError::Disabled);
        }

        let url = format!(
            "{}/api/generate-explanation",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.json::<ExplanationBody>().await;
        if !status.is_success() {
            return Err(ExplanationError::Upstream {
                status: status.as_u16(),
                message: body.ok().and_then(|body| body.error),
            });
        }

        body?
            .explanation
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty())
            .ok_or(ExplanationError::EmptyResponse)
    }
}
