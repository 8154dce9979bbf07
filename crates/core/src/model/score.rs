use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::model::ids::{ClassId, SubjectId, TermId, TopicId};
use crate::model::selection::SelectionKey;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("Please enter your name to save your results.")]
    EmptyName,

    #[error("total questions must be > 0")]
    ZeroTotal,

    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

//
// ─── PERCENTAGE ────────────────────────────────────────────────────────────────
//

/// Percentage score rounded to two decimal places.
///
/// Serialized as a fixed two-decimal string (`"66.67"`). Deserialization is
/// lenient: numbers and numeric strings are accepted and anything else reads
/// as zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Percentage(f64);

impl Percentage {
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self((value * 100.0).round() / 100.0)
        } else {
            Self(0.0)
        }
    }

    /// `(score / total) * 100`.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::ZeroTotal` or `ScoreError::ScoreExceedsTotal`.
    pub fn from_score(score: u32, total: u32) -> Result<Self, ScoreError> {
        if total == 0 {
            return Err(ScoreError::ZeroTotal);
        }
        if score > total {
            return Err(ScoreError::ScoreExceedsTotal { score, total });
        }
        Ok(Self::new(f64::from(score) / f64::from(total) * 100.0))
    }

    /// Lenient parse used for stored or client-supplied values.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim().parse::<f64>().map_or(Self(0.0), Self::new)
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct Vis;
        impl serde::de::Visitor<'_> for Vis {
            type Value = Percentage;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("percentage as number or string")
            }
            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Percentage, E> {
                Ok(Percentage::new(v))
            }
            #[allow(clippy::cast_precision_loss)]
            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Percentage, E> {
                Ok(Percentage::new(v as f64))
            }
            #[allow(clippy::cast_precision_loss)]
            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Percentage, E> {
                Ok(Percentage::new(v as f64))
            }
            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Percentage, E> {
                Ok(Percentage::parse_lenient(v))
            }
            fn visit_unit<E: serde::de::Error>(self) -> Result<Percentage, E> {
                Ok(Percentage::default())
            }
        }
        d.deserialize_any(Vis)
    }
}

//
// ─── REMARK ────────────────────────────────────────────────────────────────────
//

/// Qualitative label derived from a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Remark {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl Remark {
    /// ≥80 Excellent, ≥60 Good, ≥40 Fair, otherwise Needs Improvement.
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            Remark::Excellent
        } else if percentage >= 60.0 {
            Remark::Good
        } else if percentage >= 40.0 {
            Remark::Fair
        } else {
            Remark::NeedsImprovement
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Remark::Excellent => "Excellent",
            Remark::Good => "Good",
            Remark::Fair => "Fair",
            Remark::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for Remark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Remark {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

//
// ─── SCORE RECORD ──────────────────────────────────────────────────────────────
//

/// Inputs for a new score record; percentage and remark are derived.
#[derive(Debug, Clone)]
pub struct ScoreDraft {
    pub name: String,
    pub selection: SelectionKey,
    pub subject_name: String,
    pub topic_name: String,
    pub score: u32,
    pub total_questions: u32,
    pub date: DateTime<Utc>,
    pub attempt_id: Option<Uuid>,
}

impl ScoreDraft {
    /// Validate the draft and derive percentage and remark.
    ///
    /// The date is truncated to milliseconds, the precision it is stored and
    /// exchanged with.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError` if the name is blank or the score is out of range.
    pub fn validate(self) -> Result<ScoreRecord, ScoreError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(ScoreError::EmptyName);
        }
        let percentage = Percentage::from_score(self.score, self.total_questions)?;
        Ok(ScoreRecord {
            name,
            selection: self.selection,
            subject_name: self.subject_name.trim().to_owned(),
            topic_name: self.topic_name.trim().to_owned(),
            score: self.score,
            total_questions: self.total_questions,
            percentage,
            remark: Remark::from_percentage(percentage.value()),
            date: self.date.trunc_subsecs(3),
            attempt_id: self.attempt_id,
        })
    }
}

/// One persisted quiz-completion result. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScoreRecordWire", into = "ScoreRecordWire")]
pub struct ScoreRecord {
    name: String,
    selection: SelectionKey,
    subject_name: String,
    topic_name: String,
    score: u32,
    total_questions: u32,
    percentage: Percentage,
    remark: Remark,
    date: DateTime<Utc>,
    attempt_id: Option<Uuid>,
}

impl ScoreRecord {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn selection(&self) -> SelectionKey {
        self.selection
    }

    #[must_use]
    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    #[must_use]
    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn percentage(&self) -> Percentage {
        self.percentage
    }

    #[must_use]
    pub fn remark(&self) -> Remark {
        self.remark
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub fn attempt_id(&self) -> Option<Uuid> {
        self.attempt_id
    }

    /// Key used to drop duplicate submissions.
    ///
    /// The attempt id when present, otherwise the `(name, date, score)` tuple
    /// older clients relied on.
    #[must_use]
    pub fn dedupe_key(&self) -> String {
        match self.attempt_id {
            Some(id) => format!("attempt:{id}"),
            None => format!(
                "legacy:{}|{}|{}",
                self.name,
                iso_millis(self.date),
                self.score
            ),
        }
    }
}

/// Formats a timestamp the way browsers' `toISOString` does.
#[must_use]
pub fn iso_millis(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// JSON shape shared with browser clients and exported score files.
///
/// `percentage` and `remark` are always recomputed on the way in.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreRecordWire {
    name: String,
    class_id: ClassId,
    term_id: TermId,
    subject_id: SubjectId,
    topic_id: TopicId,
    #[serde(default)]
    subject_name: String,
    #[serde(default)]
    topic_name: String,
    score: u32,
    total_questions: u32,
    #[serde(default, skip_deserializing)]
    percentage: Percentage,
    #[serde(default, skip_deserializing)]
    remark: String,
    #[serde(serialize_with = "serialize_iso_millis")]
    date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attempt_id: Option<Uuid>,
}

fn serialize_iso_millis<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&iso_millis(*value))
}

impl TryFrom<ScoreRecordWire> for ScoreRecord {
    type Error = ScoreError;

    fn try_from(wire: ScoreRecordWire) -> Result<Self, Self::Error> {
        ScoreDraft {
            name: wire.name,
            selection: SelectionKey::new(wire.class_id, wire.term_id, wire.subject_id, wire.topic_id),
            subject_name: wire.subject_name,
            topic_name: wire.topic_name,
            score: wire.score,
            total_questions: wire.total_questions,
            date: wire.date,
            attempt_id: wire.attempt_id,
        }
        .validate()
    }
}

impl From<ScoreRecord> for ScoreRecordWire {
    fn from(record: ScoreRecord) -> Self {
        Self {
            name: record.name,
            class_id: record.selection.class_id,
            term_id: record.selection.term_id,
            subject_id: record.selection.subject_id,
            topic_id: record.selection.topic_id,
            subject_name: record.subject_name,
            topic_name: record.topic_name,
            score: record.score,
            total_questions: record.total_questions,
            percentage: record.percentage,
            remark: record.remark.as_str().to_owned(),
            date: record.date,
            attempt_id: record.attempt_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn key() -> SelectionKey {
        SelectionKey::new(ClassId::new(1), TermId::new(1), SubjectId::new(2), TopicId::new(5))
    }

    fn draft(score: u32, total: u32) -> ScoreDraft {
        ScoreDraft {
            name: " Ada ".into(),
            selection: key(),
            subject_name: "Mathematics".into(),
            topic_name: "Addition".into(),
            score,
            total_questions: total,
            date: fixed_now(),
            attempt_id: None,
        }
    }

    #[test]
    fn remark_boundaries() {
        let cases = [
            (80.0, Remark::Excellent),
            (79.9, Remark::Good),
            (60.0, Remark::Good),
            (59.9, Remark::Fair),
            (40.0, Remark::Fair),
            (39.9, Remark::NeedsImprovement),
            (0.0, Remark::NeedsImprovement),
            (100.0, Remark::Excellent),
        ];
        for (pct, expected) in cases {
            assert_eq!(Remark::from_percentage(pct), expected, "percentage {pct}");
        }
    }

    #[test]
    fn two_of_three_is_good() {
        let record = draft(2, 3).validate().unwrap();
        assert_eq!(record.percentage().to_string(), "66.67");
        assert_eq!(record.remark(), Remark::Good);
        assert_eq!(record.name(), "Ada");
    }

    #[test]
    fn rejects_blank_name_and_bad_totals() {
        let mut d = draft(1, 2);
        d.name = "   ".into();
        assert_eq!(d.validate().unwrap_err(), ScoreError::EmptyName);
        assert_eq!(draft(1, 0).validate().unwrap_err(), ScoreError::ZeroTotal);
        assert_eq!(
            draft(4, 3).validate().unwrap_err(),
            ScoreError::ScoreExceedsTotal { score: 4, total: 3 }
        );
    }

    #[test]
    fn wire_format_matches_browser_shape() {
        let record = draft(3, 4).validate().unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["percentage"], "75.00");
        assert_eq!(json["remark"], "Good");
        assert_eq!(json["date"], "2023-11-14T22:13:20.000Z");
        assert_eq!(json["classId"], 1);
        assert!(json.get("attemptId").is_none());

        let back: ScoreRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn incoming_percentage_and_remark_are_recomputed() {
        let json = serde_json::json!({
            "name": "Bola", "classId": "1", "termId": 1, "subjectId": 2, "topicId": 5,
            "score": 1, "totalQuestions": 4, "percentage": "99.00", "remark": "Excellent",
            "date": "2025-03-01T09:30:00.000Z"
        });
        let record: ScoreRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.percentage().value(), 25.0);
        assert_eq!(record.remark(), Remark::NeedsImprovement);
    }

    #[test]
    fn dedupe_key_prefers_attempt_id() {
        let legacy = draft(2, 3).validate().unwrap();
        assert_eq!(
            legacy.dedupe_key(),
            "legacy:Ada|2023-11-14T22:13:20.000Z|2"
        );

        let mut d = draft(2, 3);
        let id = Uuid::nil();
        d.attempt_id = Some(id);
        assert_eq!(d.validate().unwrap().dedupe_key(), format!("attempt:{id}"));
    }

    #[test]
    fn dates_keep_millisecond_precision() {
        let mut d = draft(1, 2);
        d.date = fixed_now() + chrono::Duration::nanoseconds(1_234_567);
        let record = d.validate().unwrap();
        assert_eq!(iso_millis(record.date()), "2023-11-14T22:13:20.001Z");
        assert_eq!(record.date(), fixed_now() + chrono::Duration::milliseconds(1));
    }

    #[test]
    fn lenient_percentage_parse() {
        assert_eq!(Percentage::parse_lenient("12.346").value(), 12.35);
        assert_eq!(Percentage::parse_lenient("n/a").value(), 0.0);
        let p: Percentage = serde_json::from_str("50").unwrap();
        assert_eq!(p.to_string(), "50.00");
    }
}
