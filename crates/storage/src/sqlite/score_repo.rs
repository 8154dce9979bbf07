use quiz_core::model::ScoreRecord;

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_score_row, timestamp_to_text};
use crate::repository::{ScoreAppend, ScoreRepository, StorageError, StoredScore};

const SCORE_COLUMNS: &str = "id, attempt_id, name, class_id, term_id, subject_id, topic_id, \
     subject_name, topic_name, score, total_questions, taken_at";

impl SqliteRepository {
    async fn score_by_dedupe_key(&self, key: &str) -> Result<StoredScore, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {SCORE_COLUMNS} FROM scores WHERE dedupe_key = ?1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;
        map_score_row(&row)
    }
}

#[async_trait::async_trait]
impl ScoreRepository for SqliteRepository {
    async fn append_score(&self, record: &ScoreRecord) -> Result<ScoreAppend, StorageError> {
        let key = record.dedupe_key();
        let selection = record.selection();

        let res = sqlx::query(
            r"
            INSERT INTO scores (
                dedupe_key, attempt_id, name, class_id, term_id, subject_id, topic_id,
                subject_name, topic_name, score, total_questions, taken_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(dedupe_key) DO NOTHING
            ",
        )
        .bind(&key)
        .bind(record.attempt_id().map(|id| id.to_string()))
        .bind(record.name())
        .bind(id_to_i64("class_id", selection.class_id.value())?)
        .bind(id_to_i64("term_id", selection.term_id.value())?)
        .bind(id_to_i64("subject_id", selection.subject_id.value())?)
        .bind(id_to_i64("topic_id", selection.topic_id.value())?)
        .bind(record.subject_name())
        .bind(record.topic_name())
        .bind(i64::from(record.score()))
        .bind(i64::from(record.total_questions()))
        .bind(timestamp_to_text(record.date()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Ok(ScoreAppend::Duplicate(self.score_by_dedupe_key(&key).await?));
        }

        Ok(ScoreAppend::Inserted(StoredScore {
            id: res.last_insert_rowid(),
            record: record.clone(),
        }))
    }

    async fn get_score(&self, id: i64) -> Result<StoredScore, StorageError> {
        let row = sqlx::query(&format!("SELECT {SCORE_COLUMNS} FROM scores WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;
        map_score_row(&row)
    }

    async fn list_scores(&self, limit: u32) -> Result<Vec<StoredScore>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SCORE_COLUMNS} FROM scores ORDER BY taken_at DESC, id DESC LIMIT ?1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_score_row).collect()
    }
}
