//! Content and score endpoints, shaped like the JSON data store browsers used
//! to talk to.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use quiz_core::model::{
    ClassLevel, Question, ScoreRecord, SelectionDraft, Subject, SubjectId, Term, Topic, TopicId,
};
use serde::Deserialize;
use services::Scoreboard;
use storage::repository::StoredScore;

use crate::{AppError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/classes", get(classes))
        .route("/terms", get(terms))
        .route("/subjects", get(subjects))
        .route("/subjects/{id}", get(subject))
        .route("/topics", get(topics))
        .route("/topics/{id}", get(topic))
        .route("/questions", get(questions))
        .route("/scores", get(scores).post(submit_score))
        .route("/scores/{id}", get(score))
        .route("/scoreboard", get(scoreboard))
}

fn parse_id<T: std::str::FromStr>(raw: &str, kind: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::NotFound(format!("{kind} {raw} not found")))
}

async fn classes(State(state): State<AppState>) -> Json<Vec<ClassLevel>> {
    Json(state.services.catalog().classes().to_vec())
}

async fn terms(State(state): State<AppState>) -> Json<Vec<Term>> {
    Json(state.services.catalog().terms().to_vec())
}

async fn subjects(
    State(state): State<AppState>,
    Query(draft): Query<SelectionDraft>,
) -> Result<Json<Vec<Subject>>, AppError> {
    let catalog = state.services.catalog();
    let subjects = catalog.subjects(&draft)?;
    Ok(Json(subjects.into_iter().cloned().collect()))
}

async fn subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Subject>, AppError> {
    let id: SubjectId = parse_id(&id, "subject")?;
    Ok(Json(state.services.catalog().subject(id)?.clone()))
}

async fn topics(
    State(state): State<AppState>,
    Query(draft): Query<SelectionDraft>,
) -> Result<Json<Vec<Topic>>, AppError> {
    let catalog = state.services.catalog();
    let topics = catalog.topics(&draft)?;
    Ok(Json(topics.into_iter().cloned().collect()))
}

async fn topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Topic>, AppError> {
    let id: TopicId = parse_id(&id, "topic")?;
    Ok(Json(state.services.catalog().topic(id)?.clone()))
}

async fn questions(
    State(state): State<AppState>,
    Query(draft): Query<SelectionDraft>,
) -> Result<Json<Vec<Question>>, AppError> {
    let catalog = state.services.catalog();
    let questions = catalog.questions(&draft)?;
    Ok(Json(questions.into_iter().cloned().collect()))
}

/// Newest first, capped at `services::scores::LIST_LIMIT` entries.
async fn scores(State(state): State<AppState>) -> Result<Json<Vec<StoredScore>>, AppError> {
    Ok(Json(state.services.scores().list().await?))
}

async fn score(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredScore>, AppError> {
    let id: i64 = parse_id(&id, "score")?;
    Ok(Json(state.services.scores().get(id).await?))
}

/// `201` with the new entry, or `200` with the existing one for a resubmission.
async fn submit_score(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredScore>), AppError> {
    let Json(raw) = body?;
    let record: ScoreRecord =
        serde_json::from_value(raw).map_err(|err| AppError::BadRequest(err.to_string()))?;
    let outcome = state.services.scores().append(&record).await?;
    let status = if outcome.is_duplicate() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome.into_stored())))
}

#[derive(Debug, Default, Deserialize)]
struct ScoreboardQuery {
    #[serde(default)]
    search: Option<String>,
}

async fn scoreboard(
    State(state): State<AppState>,
    Query(query): Query<ScoreboardQuery>,
) -> Result<Json<Scoreboard>, AppError> {
    let board = state
        .services
        .scores()
        .scoreboard(query.search.as_deref())
        .await?;
    Ok(Json(board))
}
