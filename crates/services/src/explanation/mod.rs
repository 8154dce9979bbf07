//! Explanation providers: everything that turns a question into AI text.

mod ask;
mod generative;
mod remote;
mod request;

use async_trait::async_trait;

use crate::error::ExplanationError;

pub use ask::{AskConfig, AskService, FALLBACK_ANSWER, clean_answer};
pub use generative::{GenerativeConfig, GenerativeExplanationService};
pub use remote::RemoteExplanationClient;
pub use request::{ExplanationRequest, build_prompt};

/// A backend able to explain why an answer is correct.
///
/// One call per explicit user request; implementations never retry.
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    /// Short label used in logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// False when the provider lacks credentials and every call would fail.
    fn enabled(&self) -> bool;

    /// Produce explanation text for the request.
    ///
    /// # Errors
    ///
    /// Returns `ExplanationError` on invalid input, timeouts, non-2xx
    /// responses or empty provider output.
    async fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationError>;
}

/// Provider used when nothing is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledExplanations;

#[async_trait]
impl ExplanationProvider for DisabledExplanations {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn enabled(&self) -> bool {
        false
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationError> {
        request.validate()?;
        Err(ExplanationError::Disabled)
    }
}
