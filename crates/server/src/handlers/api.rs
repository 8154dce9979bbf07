use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use quiz_core::model::{SoundPreferences, SoundPreferencesDraft};
use serde::{Deserialize, Serialize};
use services::ExplanationRequest;
use tracing::{debug, info};

use crate::error::INVALID_QUESTION;
use crate::{AppError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/generate-explanation", post(generate_explanation))
        .route("/api/ask", post(ask))
        .route("/api/sound-settings", get(sound_settings).put(save_sound_settings))
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub services: HealthServices,
}

#[derive(Debug, Serialize)]
pub struct HealthServices {
    pub api: String,
    pub database: &'static str,
    pub explanation: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "healthy",
        services: HealthServices {
            api: state.api_url.clone(),
            database: state.services.storage_backend(),
            explanation: state.services.explanations().name(),
        },
    })
}

#[derive(Debug, Serialize)]
struct ExplanationBody {
    explanation: String,
}

async fn generate_explanation(
    State(state): State<AppState>,
    body: Result<Json<ExplanationRequest>, JsonRejection>,
) -> Result<Json<ExplanationBody>, AppError> {
    let Json(request) = body?;
    let provider = state.services.explanations();
    let explanation = provider
        .explain(&request)
        .await
        .map_err(|err| AppError::explanation(&err))?;
    debug!(provider = provider.name(), chars = explanation.len(), "explanation generated");
    Ok(Json(ExplanationBody { explanation }))
}

#[derive(Debug, Deserialize)]
struct AskBody {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnswerBody {
    answer: String,
}

async fn ask(
    State(state): State<AppState>,
    body: Result<Json<AskBody>, JsonRejection>,
) -> Result<Json<AnswerBody>, AppError> {
    let question = body
        .ok()
        .and_then(|Json(body)| body.question)
        .ok_or_else(|| AppError::BadRequest(INVALID_QUESTION.into()))?;
    let answer = state.services.ask().ask(&question).await.map_err(AppError::ask)?;
    Ok(Json(AnswerBody { answer }))
}

async fn sound_settings(State(state): State<AppState>) -> Result<Json<SoundPreferences>, AppError> {
    Ok(Json(state.services.sound_settings().load().await?))
}

async fn save_sound_settings(
    State(state): State<AppState>,
    body: Result<Json<SoundPreferencesDraft>, JsonRejection>,
) -> Result<Json<SoundPreferences>, AppError> {
    let Json(draft) = body?;
    let saved = state.services.sound_settings().save(draft).await?;
    info!(muted = saved.muted(), volume = saved.volume(), "sound settings saved");
    Ok(Json(saved))
}
