use async_trait::async_trait;
use quiz_core::model::ScoreRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A score record together with its storage id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredScore {
    pub id: i64,
    #[serde(flatten)]
    pub record: ScoreRecord,
}

/// Outcome of appending a score.
///
/// Duplicate submissions are not errors: the caller gets back the entry that
/// was already stored.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreAppend {
    Inserted(StoredScore),
    Duplicate(StoredScore),
}

impl ScoreAppend {
    #[must_use]
    pub fn stored(&self) -> &StoredScore {
        match self {
            ScoreAppend::Inserted(stored) | ScoreAppend::Duplicate(stored) => stored,
        }
    }

    #[must_use]
    pub fn into_stored(self) -> StoredScore {
        match self {
            ScoreAppend::Inserted(stored) | ScoreAppend::Duplicate(stored) => stored,
        }
    }

    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ScoreAppend::Duplicate(_))
    }
}

/// Append-only store for completed quiz results.
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Append a score unless one with the same dedupe key already exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the score cannot be stored.
    async fn append_score(&self, record: &ScoreRecord) -> Result<ScoreAppend, StorageError>;

    /// Fetch a score by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_score(&self, id: i64) -> Result<StoredScore, StorageError>;

    /// List scores, newest first (by date, then id).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_scores(&self, limit: u32) -> Result<Vec<StoredScore>, StorageError>;
}

/// Flat key/value preferences, mirroring the browser's local storage keys.
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Read a single preference.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_preference(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Read every preference whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_preferences(&self, prefix: &str) -> Result<HashMap<String, String>, StorageError>;

    /// Insert or overwrite several preferences at once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any entry cannot be written.
    async fn set_preferences(&self, entries: &[(String, String)]) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct ScoreTable {
    rows: Vec<StoredScore>,
    by_key: HashMap<String, i64>,
    next_id: i64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    scores: Arc<Mutex<ScoreTable>>,
    preferences: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ScoreRepository for InMemoryRepository {
    async fn append_score(&self, record: &ScoreRecord) -> Result<ScoreAppend, StorageError> {
        let mut guard = self.scores.lock().map_err(poisoned)?;
        let key = record.dedupe_key();
        if let Some(id) = guard.by_key.get(&key).copied() {
            let existing = guard
                .rows
                .iter()
                .find(|row| row.id == id)
                .cloned()
                .ok_or(StorageError::NotFound)?;
            return Ok(ScoreAppend::Duplicate(existing));
        }

        guard.next_id += 1;
        let stored = StoredScore {
            id: guard.next_id,
            record: record.clone(),
        };
        guard.by_key.insert(key, stored.id);
        guard.rows.push(stored.clone());
        Ok(ScoreAppend::Inserted(stored))
    }

    async fn get_score(&self, id: i64) -> Result<StoredScore, StorageError> {
        let guard = self.scores.lock().map_err(poisoned)?;
        guard
            .rows
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_scores(&self, limit: u32) -> Result<Vec<StoredScore>, StorageError> {
        let guard = self.scores.lock().map_err(poisoned)?;
        let mut rows = guard.rows.clone();
        rows.sort_by(|a, b| {
            b.record
                .date()
                .cmp(&a.record.date())
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

#[async_trait]
impl PreferenceRepository for InMemoryRepository {
    async fn get_preference(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.preferences.lock().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    async fn list_preferences(&self, prefix: &str) -> Result<HashMap<String, String>, StorageError> {
        let guard = self.preferences.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn set_preferences(&self, entries: &[(String, String)]) -> Result<(), StorageError> {
        let mut guard = self.preferences.lock().map_err(poisoned)?;
        for (key, value) in entries {
            guard.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub scores: Arc<dyn ScoreRepository>,
    pub preferences: Arc<dyn PreferenceRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let scores: Arc<dyn ScoreRepository> = Arc::new(repo.clone());
        let preferences: Arc<dyn PreferenceRepository> = Arc::new(repo);
        Self {
            scores,
            preferences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{ClassId, ScoreDraft, SelectionKey, SubjectId, TermId, TopicId};
    use quiz_core::time::fixed_now;

    fn record(name: &str, score: u32, minutes: i64) -> ScoreRecord {
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
            date: fixed_now() + Duration::minutes(minutes),
            attempt_id: None,
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_submissions_store_once() {
        let repo = InMemoryRepository::new();
        let first = repo.append_score(&record("Ada", 2, 0)).await.unwrap();
        let second = repo.append_score(&record("Ada", 2, 0)).await.unwrap();

        assert!(!first.is_duplicate());
        assert!(second.is_duplicate());
        assert_eq!(first.stored().id, second.stored().id);
        assert_eq!(repo.list_scores(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lists_newest_first_with_limit() {
        let repo = InMemoryRepository::new();
        repo.append_score(&record("Ada", 1, 0)).await.unwrap();
        repo.append_score(&record("Bola", 2, 10)).await.unwrap();
        repo.append_score(&record("Chi", 3, 5)).await.unwrap();

        let names: Vec<_> = repo
            .list_scores(2)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.record.name().to_owned())
            .collect();
        assert_eq!(names, ["Bola", "Chi"]);
    }

    #[tokio::test]
    async fn preferences_filter_by_prefix() {
        let repo = InMemoryRepository::new();
        repo.set_preferences(&[
            ("sound_volume".into(), "40".into()),
            ("theme".into(), "dark".into()),
        ])
        .await
        .unwrap();

        let sound = repo.list_preferences("sound_").await.unwrap();
        assert_eq!(sound.len(), 1);
        assert_eq!(
            repo.get_preference("theme").await.unwrap().as_deref(),
            Some("dark")
        );
        assert!(matches!(repo.get_score(1).await, Err(StorageError::NotFound)));
    }
}
