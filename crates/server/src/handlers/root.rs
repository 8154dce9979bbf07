use axum::{Router, routing::get};

use crate::AppState;

const ENDPOINTS: &str = "\
Quiz API server

Available endpoints:
  GET  /api/health               service status
  POST /api/generate-explanation explanation for a question and its answer
  POST /api/ask                  free-form question to the AI helper
  GET  /api/sound-settings       stored sound preferences
  PUT  /api/sound-settings       update sound preferences
  GET  /db/classes | /db/terms
  GET  /db/subjects?classId&termId, /db/subjects/{id}
  GET  /db/topics?classId&termId&subjectId, /db/topics/{id}
  GET  /db/questions?classId&termId&subjectId&topicId
  GET  /db/scores, POST /db/scores, GET /db/scores/{id}
  GET  /db/scoreboard?search=
";

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index() -> &'static str {
    ENDPOINTS
}
