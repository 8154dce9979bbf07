mod common;

use std::io::Cursor;
use std::sync::Arc;

use quiz_core::model::SelectionDraft;
use quiz_server::play::{PlayError, PlayOutcome, TerminalQuiz};
use services::{AskService, Providers, QuizError};

use common::{CannedExplanations, services_with};

fn selection(topic: &str) -> SelectionDraft {
    SelectionDraft {
        class_id: Some("1".into()),
        term_id: Some("1".into()),
        subject_id: Some("2".into()),
        topic_id: Some(topic.into()),
    }
}

fn providers() -> Providers {
    Providers {
        explanations: Arc::new(CannedExplanations("Because 1 + 1 = 2.")),
        ask: Arc::new(AskService::new(None)),
    }
}

#[tokio::test]
async fn full_quiz_is_scored_and_saved() {
    let services = services_with(providers()).await;
    let quiz = services.quiz_loop();
    let input = Cursor::new("7\n2\nd\n\n2\n\nBola\n");
    let mut output = Vec::new();

    let outcome = TerminalQuiz::new(quiz.as_ref(), input, &mut output)
        .run(&selection("5"), None)
        .await
        .unwrap();

    let PlayOutcome::Saved(saved) = outcome else {
        panic!("expected a saved score, got {outcome:?}");
    };
    assert!(!saved.is_duplicate());
    assert_eq!(saved.stored().record.name(), "Bola");
    assert_eq!(saved.stored().record.score(), 2);

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Question 1/2: 1 + 1?"), "{text}");
    assert!(text.contains("Pick a number between 1 and 3."), "{text}");
    assert!(text.contains("Explanation: One and one make two."), "{text}");
    assert!(text.contains("Deeper explanation: Because 1 + 1 = 2."), "{text}");
    assert!(text.contains("You scored 2/2 (100.00%): Excellent"), "{text}");

    let stored = services.scores().list().await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn quitting_or_skipping_the_name_stores_nothing() {
    let services = services_with(providers()).await;
    let quiz = services.quiz_loop();

    let outcome = TerminalQuiz::new(quiz.as_ref(), Cursor::new("q\n"), Vec::new())
        .run(&selection("5"), None)
        .await
        .unwrap();
    assert!(matches!(outcome, PlayOutcome::Abandoned));

    let outcome = TerminalQuiz::new(quiz.as_ref(), Cursor::new("1\n\ns\n\n"), Vec::new())
        .run(&selection("5"), None)
        .await
        .unwrap();
    assert!(matches!(outcome, PlayOutcome::Unsaved));

    assert_eq!(services.scores().list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_topic_is_not_found() {
    let services = services_with(providers()).await;
    let quiz = services.quiz_loop();

    let err = TerminalQuiz::new(quiz.as_ref(), Cursor::new(""), Vec::new())
        .run(&selection("99"), Some("Ada".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, PlayError::Quiz(QuizError::NotFound(_))));
}
