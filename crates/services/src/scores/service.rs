use std::sync::Arc;

use quiz_core::model::{ScoreDraft, ScoreRecord};
use storage::repository::{ScoreAppend, ScoreRepository, StorageError, StoredScore};
use tracing::{error, info};

use super::scoreboard::{Scoreboard, aggregate};
use crate::error::QuizError;

/// Upper bound on rows returned by [`ScoreService::list`]. The scoreboard
/// always reads every row.
pub const LIST_LIMIT: u32 = 10_000;

/// Validates, stores and reads back quiz results.
#[derive(Clone)]
pub struct ScoreService {
    scores: Arc<dyn ScoreRepository>,
}

impl ScoreService {
    #[must_use]
    pub fn new(scores: Arc<dyn ScoreRepository>) -> Self {
        Self { scores }
    }

    /// Validate and store a new result.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InputValidation` for an empty name or an
    /// impossible score, and `QuizError::Storage` on backend failures.
    pub async fn submit(&self, draft: ScoreDraft) -> Result<ScoreAppend, QuizError> {
        let record = draft.validate()?;
        self.append(&record).await
    }

    /// Store an already validated record. Resubmissions return the existing
    /// entry instead of adding a second one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on backend failures.
    pub async fn append(&self, record: &ScoreRecord) -> Result<ScoreAppend, QuizError> {
        let outcome = self.scores.append_score(record).await.inspect_err(|err| {
            error!(error = %err, "failed to store score");
        })?;
        let stored = outcome.stored();
        if outcome.is_duplicate() {
            info!(id = stored.id, name = record.name(), "duplicate score ignored");
        } else {
            info!(
                id = stored.id,
                name = record.name(),
                score = record.score(),
                total = record.total_questions(),
                "score saved"
            );
        }
        Ok(outcome)
    }

    /// Store bundled records, returning how many were new.
    ///
    /// # Errors
    ///
    /// Returns the first `StorageError`.
    pub async fn import(&self, records: &[ScoreRecord]) -> Result<usize, StorageError> {
        let mut inserted = 0;
        for record in records {
            if !self.scores.append_score(record).await?.is_duplicate() {
                inserted += 1;
            }
        }
        if inserted > 0 {
            info!(inserted, "imported bundled scores");
        }
        Ok(inserted)
    }

    /// The newest [`LIST_LIMIT`] results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on backend failures.
    pub async fn list(&self) -> Result<Vec<StoredScore>, QuizError> {
        Ok(self.scores.list_scores(LIST_LIMIT).await?)
    }

    /// One stored result.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` wrapping `StorageError::NotFound` for an
    /// unknown id.
    pub async fn get(&self, id: i64) -> Result<StoredScore, QuizError> {
        Ok(self.scores.get_score(id).await?)
    }

    /// Per-learner statistics, optionally filtered by a search term.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on backend failures.
    pub async fn scoreboard(&self, search: Option<&str>) -> Result<Scoreboard, QuizError> {
        let scores = self.scores.list_scores(u32::MAX).await?;
        Ok(aggregate(&scores, search))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{ClassId, SelectionKey, SubjectId, TermId, TopicId};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn draft(name: &str, score: u32) -> ScoreDraft {
        ScoreDraft {
            name: name.into(),
            selection: SelectionKey::new(
                ClassId::new(1),
                TermId::new(1),
                SubjectId::new(2),
                TopicId::new(5),
            ),
            subject_name: "Mathematics".into(),
            topic_name: "Addition".into(),
            score,
            total_questions: 3,
            date: fixed_now(),
            attempt_id: None,
        }
    }

    fn service() -> ScoreService {
        ScoreService::new(Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn same_record_twice_is_stored_once() {
        let svc = service();
        let first = svc.submit(draft("Ada", 2)).await.unwrap();
        let second = svc.submit(draft("Ada", 2)).await.unwrap();
        assert!(second.is_duplicate());
        assert_eq!(first.stored().id, second.stored().id);
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let err = service().submit(draft("  ", 1)).await.unwrap_err();
        assert!(matches!(err, QuizError::InputValidation(_)));
        assert_eq!(err.to_string(), "Please enter your name to save your results.");
    }

    #[tokio::test]
    async fn import_counts_new_records() {
        let svc = service();
        let records = vec![
            draft("Ada", 1).validate().unwrap(),
            draft("Bola", 2).validate().unwrap(),
        ];
        assert_eq!(svc.import(&records).await.unwrap(), 2);
        assert_eq!(svc.import(&records).await.unwrap(), 0);

        let board = svc.scoreboard(Some("bola")).await.unwrap();
        assert_eq!(board.groups.len(), 1);
    }

    #[tokio::test]
    async fn get_returns_stored_entry_or_not_found() {
        let svc = service();
        let stored = svc.submit(draft("Ada", 2)).await.unwrap().into_stored();
        assert_eq!(svc.get(stored.id).await.unwrap(), stored);
        assert!(matches!(
            svc.get(stored.id + 1).await,
            Err(QuizError::Storage(StorageError::NotFound))
        ));
    }

    #[tokio::test]
    async fn scoreboard_counts_rows_beyond_the_list_limit() {
        let svc = service();
        let records: Vec<ScoreRecord> = (0..=LIST_LIMIT)
            .map(|n| {
                let mut d = draft("Ada", n % 4);
                d.date = fixed_now() + chrono::Duration::seconds(i64::from(n));
                d.validate().unwrap()
            })
            .collect();
        svc.import(&records).await.unwrap();

        assert_eq!(svc.list().await.unwrap().len(), LIST_LIMIT as usize);
        let board = svc.scoreboard(None).await.unwrap();
        assert_eq!(board.overall.attempts, LIST_LIMIT as usize + 1);
    }
}
