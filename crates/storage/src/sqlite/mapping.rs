use chrono::{DateTime, Utc};
use quiz_core::model::{
    ClassId, ScoreDraft, SelectionKey, SubjectId, TermId, TopicId, iso_millis,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::repository::{StorageError, StoredScore};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

/// Timestamps are stored as fixed-width ISO strings so text order is time order.
pub(crate) fn timestamp_to_text(value: DateTime<Utc>) -> String {
    iso_millis(value)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("invalid taken_at {raw:?}: {e}")))
}

pub(crate) fn map_score_row(row: &SqliteRow) -> Result<StoredScore, StorageError> {
    let selection = SelectionKey::new(
        ClassId::new(i64_to_u64("class_id", row.try_get("class_id").map_err(ser)?)?),
        TermId::new(i64_to_u64("term_id", row.try_get("term_id").map_err(ser)?)?),
        SubjectId::new(i64_to_u64("subject_id", row.try_get("subject_id").map_err(ser)?)?),
        TopicId::new(i64_to_u64("topic_id", row.try_get("topic_id").map_err(ser)?)?),
    );
    let attempt_id = row
        .try_get::<Option<String>, _>("attempt_id")
        .map_err(ser)?
        .map(|raw| Uuid::parse_str(&raw).map_err(ser))
        .transpose()?;
    let taken_at: String = row.try_get("taken_at").map_err(ser)?;

    let record = ScoreDraft {
        name: row.try_get("name").map_err(ser)?,
        selection,
        subject_name: row.try_get("subject_name").map_err(ser)?,
        topic_name: row.try_get("topic_name").map_err(ser)?,
        score: i64_to_u32("score", row.try_get("score").map_err(ser)?)?,
        total_questions: i64_to_u32(
            "total_questions",
            row.try_get("total_questions").map_err(ser)?,
        )?,
        date: parse_timestamp(&taken_at)?,
        attempt_id,
    }
    .validate()
    .map_err(ser)?;

    Ok(StoredScore {
        id: row.try_get("id").map_err(ser)?,
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[test]
    fn timestamps_round_trip_through_text() {
        let text = timestamp_to_text(fixed_now());
        assert_eq!(text, "2023-11-14T22:13:20.000Z");
        assert_eq!(parse_timestamp(&text).unwrap(), fixed_now());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(i64_to_u64("class_id", -1).is_err());
        assert_eq!(id_to_i64("class_id", 7).unwrap(), 7);
        assert!(id_to_i64("class_id", u64::MAX).is_err());
    }
}
