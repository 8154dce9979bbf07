use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use quiz_core::model::{CatalogDraft, SelectionDraft};
use quiz_core::time::fixed_now;
use services::explanation::ExplanationProvider;
use services::sessions::ExplanationLevel;
use services::{
    CatalogService, Clock, ExplanationError, ExplanationRequest, QuizError, QuizLoopService,
    ScoreService,
};
use storage::repository::{InMemoryRepository, ScoreRepository};

struct CountingProvider {
    calls: AtomicUsize,
    /// Number of leading calls that time out.
    failures: usize,
}

impl CountingProvider {
    fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failures,
        })
    }
}

#[async_trait]
impl ExplanationProvider for CountingProvider {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(ExplanationError::Timeout);
        }
        Ok(format!("{} because it is.", request.correct_answer))
    }
}

fn catalog() -> CatalogService {
    let draft: CatalogDraft = serde_json::from_value(serde_json::json!({
        "classes": [{ "id": 1, "name": "Primary 1" }],
        "terms": [{ "id": 1, "name": "First Term" }],
        "subjects": [{ "id": 2, "classId": 1, "termId": 1, "name": "Mathematics" }],
        "topics": [{ "id": 5, "classId": 1, "termId": 1, "subjectId": 2, "name": "Addition" }],
        "questions": [
            { "id": 1, "classId": 1, "termId": 1, "subjectId": 2, "topicId": 5,
              "question": "1 + 1?", "options": ["2", "3"], "correctAnswer": "2",
              "explanation": "One and one." },
            { "id": 2, "classId": 1, "termId": 1, "subjectId": 2, "topicId": 5,
              "question": "2 + 2?", "options": ["4", "5"], "correctAnswer": "4",
              "explanation": "Two and two." },
            { "id": 3, "classId": 1, "termId": 1, "subjectId": 2, "topicId": 5,
              "question": "3 + 3?", "options": ["6", "7"], "correctAnswer": "6",
              "explanation": "Three and three." }
        ]
    }))
    .unwrap();
    CatalogService::new(draft.validate().unwrap())
}

fn selection(topic: &str) -> SelectionDraft {
    SelectionDraft {
        class_id: Some("1".into()),
        term_id: Some("1".into()),
        subject_id: Some("2".into()),
        topic_id: Some(topic.into()),
    }
}

fn loop_service(
    provider: Arc<CountingProvider>,
    repo: &InMemoryRepository,
) -> QuizLoopService {
    QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(catalog()),
        provider,
        Arc::new(ScoreService::new(Arc::new(repo.clone()))),
    )
}

#[tokio::test]
async fn full_quiz_saves_one_score() {
    let repo = InMemoryRepository::new();
    let svc = loop_service(CountingProvider::new(0), &repo);

    let mut session = svc.start(&selection("5")).unwrap();
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.score(), 0);

    for option in ["2", "5", "6"] {
        session.submit_answer(option).unwrap();
        svc.advance(&mut session).unwrap();
    }
    assert!(session.is_complete());

    let saved = svc.finish(&session, "Ada").await.unwrap();
    let record = &saved.stored().record;
    assert_eq!(record.score(), 2);
    assert_eq!(record.percentage().to_string(), "66.67");
    assert_eq!(record.remark().as_str(), "Good");
    assert_eq!(record.subject_name(), "Mathematics");
    assert_eq!(record.topic_name(), "Addition");
    assert_eq!(record.attempt_id(), Some(session.attempt_id()));

    let again = svc.finish(&session, "Ada").await.unwrap();
    assert!(again.is_duplicate());
    assert_eq!(repo.list_scores(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn deep_explanation_is_fetched_once() {
    let provider = CountingProvider::new(0);
    let repo = InMemoryRepository::new();
    let svc = loop_service(Arc::clone(&provider), &repo);

    let mut session = svc.start(&selection("5")).unwrap();
    session.submit_answer("3").unwrap();
    svc.deepen(&mut session).await.unwrap();
    svc.deepen(&mut session).await.unwrap();

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.explanation_level(), ExplanationLevel::Deep);
    assert_eq!(session.deep_explanation(), Some("2 because it is."));
}

#[tokio::test]
async fn failed_fetch_does_not_block_progress() {
    let repo = InMemoryRepository::new();
    let svc = loop_service(CountingProvider::new(usize::MAX), &repo);

    let mut session = svc.start(&selection("5")).unwrap();
    session.submit_answer("2").unwrap();
    svc.deepen(&mut session).await.unwrap();

    assert_eq!(session.explanation_level(), ExplanationLevel::Deep);
    assert_eq!(session.explanation_error(), Some("Request timed out"));
    assert_eq!(session.deep_explanation(), Some("One and one."));
    svc.advance(&mut session).unwrap();
    assert_eq!(session.current_index(), 1);
}

#[tokio::test]
async fn failed_fetch_is_retried_on_request() {
    let provider = CountingProvider::new(1);
    let repo = InMemoryRepository::new();
    let svc = loop_service(Arc::clone(&provider), &repo);

    let mut session = svc.start(&selection("5")).unwrap();
    session.submit_answer("2").unwrap();
    svc.deepen(&mut session).await.unwrap();
    assert_eq!(session.explanation_error(), Some("Request timed out"));

    svc.deepen(&mut session).await.unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(session.explanation_error(), None);
    assert_eq!(session.deep_explanation(), Some("2 because it is."));
}

#[tokio::test]
async fn invalid_or_empty_selection_is_rejected() {
    let repo = InMemoryRepository::new();
    let svc = loop_service(CountingProvider::new(0), &repo);

    let mut missing = selection("5");
    missing.subject_id = None;
    assert!(matches!(
        svc.start(&missing),
        Err(QuizError::InputValidation(_))
    ));
    assert!(matches!(
        svc.start(&selection("77")),
        Err(QuizError::NotFound(_))
    ));
}

#[tokio::test]
async fn unfinished_quiz_cannot_be_saved() {
    let repo = InMemoryRepository::new();
    let svc = loop_service(CountingProvider::new(0), &repo);
    let session = svc.start(&selection("5")).unwrap();
    assert!(matches!(
        svc.finish(&session, "Ada").await,
        Err(QuizError::Session(_))
    ));
}
