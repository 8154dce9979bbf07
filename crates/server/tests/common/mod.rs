#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use quiz_core::time::fixed_clock;
use quiz_server::{AppState, router};
use services::explanation::DisabledExplanations;
use services::{AppServices, AskService, ExplanationError, ExplanationProvider, ExplanationRequest, Providers};
use storage::content::ContentDocument;
use tower::ServiceExt;

pub const FRONTEND_ORIGIN: &str = "http://localhost:5173";

pub const CONTENT: &str = r#"{
  "classes": [{ "id": 1, "name": "Primary 1" }, { "id": 2, "name": "Primary 2" }],
  "terms": [{ "id": 1, "name": "First Term" }],
  "subjects": [
    { "id": 2, "classId": 1, "termId": 1, "name": "Mathematics" },
    { "id": 3, "classId": 2, "termId": 1, "name": "English" }
  ],
  "topics": [{ "id": 5, "classId": 1, "termId": 1, "subjectId": 2, "name": "Addition" }],
  "questions": [
    {
      "id": 1, "classId": 1, "termId": 1, "subjectId": 2, "topicId": 5,
      "question": "1 + 1?", "options": ["1", "2", "3"], "correctAnswer": "2",
      "explanation": "One and one make two."
    },
    {
      "id": 2, "classId": 1, "termId": 1, "subjectId": 2, "topicId": 5,
      "question": "2 + 2?", "options": ["3", "4"], "correctAnswer": "4",
      "explanation": "Two pairs make four."
    }
  ],
  "scores": [
    {
      "name": "Ada", "classId": 1, "termId": 1, "subjectId": 2, "topicId": 5,
      "subjectName": "Mathematics", "topicName": "Addition",
      "score": 1, "totalQuestions": 2, "date": "2024-03-01T10:00:00.000Z"
    }
  ]
}"#;

/// Explanation provider returning canned text.
pub struct CannedExplanations(pub &'static str);

#[async_trait]
impl ExplanationProvider for CannedExplanations {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationError> {
        request.validate()?;
        Ok(self.0.to_owned())
    }
}

pub async fn services_with(providers: Providers) -> AppServices {
    let content = ContentDocument::from_json_str(CONTENT).expect("content should parse");
    AppServices::new_in_memory(content, fixed_clock(), providers)
        .await
        .expect("services should build")
}

pub async fn app_with(providers: Providers) -> Router {
    let services = services_with(providers).await;
    router(AppState::new(
        services,
        vec![FRONTEND_ORIGIN.to_owned()],
        "http://127.0.0.1:5000",
    ))
}

pub async fn app() -> Router {
    app_with(Providers {
        explanations: Arc::new(CannedExplanations("Because 1 + 1 = 2.")),
        ask: Arc::new(AskService::new(None)),
    })
    .await
}

pub async fn disabled_app() -> Router {
    app_with(Providers {
        explanations: Arc::new(DisabledExplanations),
        ask: Arc::new(AskService::new(None)),
    })
    .await
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            req = req.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(req.body(body).expect("request build should succeed"))
        .await
        .expect("router should respond")
}

pub async fn json_body(resp: Response<Body>) -> serde_json::Value {
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn text_body(resp: Response<Body>) -> String {
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Serve `app` on an ephemeral local port.
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake server should run");
    });
    addr
}
