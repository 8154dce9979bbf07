use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{ClassId, SubjectId, TermId, TopicId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {raw:?}")]
    Invalid { field: &'static str, raw: String },
}

/// The (class, term, subject, topic) tuple identifying a question pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionKey {
    pub class_id: ClassId,
    pub term_id: TermId,
    pub subject_id: SubjectId,
    pub topic_id: TopicId,
}

impl SelectionKey {
    #[must_use]
    pub fn new(class_id: ClassId, term_id: TermId, subject_id: SubjectId, topic_id: TopicId) -> Self {
        Self {
            class_id,
            term_id,
            subject_id,
            topic_id,
        }
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class={} term={} subject={} topic={}",
            self.class_id, self.term_id, self.subject_id, self.topic_id
        )
    }
}

/// A partially filled selection, as it arrives from query strings or CLI flags.
///
/// Values stay raw until `validate`, so a blank `classId=` reads as missing
/// rather than as a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDraft {
    pub class_id: Option<String>,
    pub term_id: Option<String>,
    pub subject_id: Option<String>,
    pub topic_id: Option<String>,
}

impl SelectionDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_key(key: SelectionKey) -> Self {
        Self {
            class_id: Some(key.class_id.to_string()),
            term_id: Some(key.term_id.to_string()),
            subject_id: Some(key.subject_id.to_string()),
            topic_id: Some(key.topic_id.to_string()),
        }
    }

    /// Validate that all four keys are present and numeric.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Missing` naming the first absent or blank key,
    /// or `SelectionError::Invalid` if a value is not a valid id.
    pub fn validate(&self) -> Result<SelectionKey, SelectionError> {
        Ok(SelectionKey {
            class_id: parse_field(self.class_id.as_deref(), "classId")?,
            term_id: parse_field(self.term_id.as_deref(), "termId")?,
            subject_id: parse_field(self.subject_id.as_deref(), "subjectId")?,
            topic_id: parse_field(self.topic_id.as_deref(), "topicId")?,
        })
    }

    /// Validate the keys needed to list subjects.
    ///
    /// # Errors
    ///
    /// Same as [`SelectionDraft::validate`], limited to `classId` and `termId`.
    pub fn validate_term_scope(&self) -> Result<(ClassId, TermId), SelectionError> {
        Ok((
            parse_field(self.class_id.as_deref(), "classId")?,
            parse_field(self.term_id.as_deref(), "termId")?,
        ))
    }

    /// Validate the keys needed to list topics.
    ///
    /// # Errors
    ///
    /// Same as [`SelectionDraft::validate`], without `topicId`.
    pub fn validate_subject_scope(&self) -> Result<(ClassId, TermId, SubjectId), SelectionError> {
        let (class_id, term_id) = self.validate_term_scope()?;
        Ok((
            class_id,
            term_id,
            parse_field(self.subject_id.as_deref(), "subjectId")?,
        ))
    }
}

fn parse_field<T: std::str::FromStr>(
    raw: Option<&str>,
    field: &'static str,
) -> Result<T, SelectionError> {
    let value = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SelectionError::Missing(field))?;
    value.parse().map_err(|_| SelectionError::Invalid {
        field,
        raw: value.to_owned(),
    })
}
