use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::model::ids::{ClassId, QuestionId, SubjectId, TermId, TopicId};
use crate::model::question::{Question, QuestionDraft, QuestionError};
use crate::model::selection::SelectionKey;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("{kind} {id} has an empty name")]
    EmptyName { kind: &'static str, id: u64 },

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u64 },

    #[error("{kind} {id} references unknown {parent} {parent_id}")]
    UnknownParent {
        kind: &'static str,
        id: u64,
        parent: &'static str,
        parent_id: u64,
    },

    #[error("{kind} {id} has {field} {found} but its {parent} has {expected}")]
    MismatchedParent {
        kind: &'static str,
        id: u64,
        parent: &'static str,
        field: &'static str,
        expected: u64,
        found: u64,
    },

    #[error("question {id}: {source}")]
    Question {
        id: QuestionId,
        #[source]
        source: QuestionError,
    },
}

//
// ─── ENTITIES ──────────────────────────────────────────────────────────────────
//

/// A class (school year) learners pick first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLevel {
    pub id: ClassId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub class_id: ClassId,
    pub term_id: TermId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub class_id: ClassId,
    pub term_id: TermId,
    pub subject_id: SubjectId,
    pub name: String,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Raw content document (`classes`, `terms`, `subjects`, `topics`, `questions`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDraft {
    #[serde(default)]
    pub classes: Vec<ClassLevel>,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

impl CatalogDraft {
    /// Validate names, id uniqueness, parent references and every question.
    ///
    /// # Errors
    ///
    /// Returns the first `CatalogError` found; validation does not attempt to
    /// collect all problems.
    pub fn validate(self) -> Result<Catalog, CatalogError> {
        let class_ids = unique_ids("class", self.classes.iter().map(|c| (c.id.value(), &c.name)))?;
        let term_ids = unique_ids("term", self.terms.iter().map(|t| (t.id.value(), &t.name)))?;
        unique_ids("subject", self.subjects.iter().map(|s| (s.id.value(), &s.name)))?;
        unique_ids("topic", self.topics.iter().map(|t| (t.id.value(), &t.name)))?;

        for subject in &self.subjects {
            require_parent("subject", subject.id.value(), "class", subject.class_id.value(), &class_ids)?;
            require_parent("subject", subject.id.value(), "term", subject.term_id.value(), &term_ids)?;
        }

        let subjects: HashMap<SubjectId, &Subject> =
            self.subjects.iter().map(|s| (s.id, s)).collect();
        for topic in &self.topics {
            let Some(subject) = subjects.get(&topic.subject_id) else {
                return Err(CatalogError::UnknownParent {
                    kind: "topic",
                    id: topic.id.value(),
                    parent: "subject",
                    parent_id: topic.subject_id.value(),
                });
            };
            let parent = Lineage::of_subject(subject);
            parent.check("topic", topic.id.value(), "subject", Lineage::of_topic(topic))?;
        }

        let topics: HashMap<TopicId, &Topic> = self.topics.iter().map(|t| (t.id, t)).collect();
        let mut seen_questions = HashSet::new();
        let mut questions = Vec::with_capacity(self.questions.len());
        for draft in self.questions {
            let id = draft.id;
            if !seen_questions.insert(id) {
                return Err(CatalogError::DuplicateId {
                    kind: "question",
                    id: id.value(),
                });
            }
            let Some(topic) = topics.get(&draft.topic_id) else {
                return Err(CatalogError::UnknownParent {
                    kind: "question",
                    id: id.value(),
                    parent: "topic",
                    parent_id: draft.topic_id.value(),
                });
            };
            Lineage::of_topic(topic).check(
                "question",
                id.value(),
                "topic",
                Lineage {
                    class_id: draft.class_id,
                    term_id: draft.term_id,
                    subject_id: Some(draft.subject_id),
                },
            )?;
            let question = draft
                .validate()
                .map_err(|source| CatalogError::Question { id, source })?;
            questions.push(question);
        }

        Ok(Catalog {
            classes: self.classes,
            terms: self.terms,
            subjects: self.subjects,
            topics: self.topics,
            questions,
        })
    }
}

fn unique_ids<'a>(
    kind: &'static str,
    entries: impl Iterator<Item = (u64, &'a String)>,
) -> Result<HashSet<u64>, CatalogError> {
    let mut seen = HashSet::new();
    for (id, name) in entries {
        if name.trim().is_empty() {
            return Err(CatalogError::EmptyName { kind, id });
        }
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId { kind, id });
        }
    }
    Ok(seen)
}

fn require_parent(
    kind: &'static str,
    id: u64,
    parent: &'static str,
    parent_id: u64,
    known: &HashSet<u64>,
) -> Result<(), CatalogError> {
    if known.contains(&parent_id) {
        Ok(())
    } else {
        Err(CatalogError::UnknownParent {
            kind,
            id,
            parent,
            parent_id,
        })
    }
}

/// Class, term and (for topics and questions) subject an entry is filed under.
#[derive(Clone, Copy)]
struct Lineage {
    class_id: ClassId,
    term_id: TermId,
    subject_id: Option<SubjectId>,
}

impl Lineage {
    fn of_subject(subject: &Subject) -> Self {
        Self {
            class_id: subject.class_id,
            term_id: subject.term_id,
            subject_id: None,
        }
    }

    fn of_topic(topic: &Topic) -> Self {
        Self {
            class_id: topic.class_id,
            term_id: topic.term_id,
            subject_id: Some(topic.subject_id),
        }
    }

    /// `child` must be filed under the same class and term, and the same
    /// subject when both sides name one.
    fn check(
        self,
        kind: &'static str,
        id: u64,
        parent: &'static str,
        child: Lineage,
    ) -> Result<(), CatalogError> {
        let mismatch = |field, expected: u64, found: u64| CatalogError::MismatchedParent {
            kind,
            id,
            parent,
            field,
            expected,
            found,
        };
        if child.class_id != self.class_id {
            return Err(mismatch("classId", self.class_id.value(), child.class_id.value()));
        }
        if child.term_id != self.term_id {
            return Err(mismatch("termId", self.term_id.value(), child.term_id.value()));
        }
        match (self.subject_id, child.subject_id) {
            (Some(expected), Some(found)) if expected != found => {
                Err(mismatch("subjectId", expected.value(), found.value()))
            }
            _ => Ok(()),
        }
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Validated, read-only content hierarchy.
///
/// Every listing preserves the order of the source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    classes: Vec<ClassLevel>,
    terms: Vec<Term>,
    subjects: Vec<Subject>,
    topics: Vec<Topic>,
    questions: Vec<Question>,
}

impl Catalog {
    #[must_use]
    pub fn classes(&self) -> &[ClassLevel] {
        &self.classes
    }

    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    #[must_use]
    pub fn class(&self, id: ClassId) -> Option<&ClassLevel> {
        self.classes.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn term(&self, id: TermId) -> Option<&Term> {
        self.terms.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn topic(&self, id: TopicId) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    /// Subjects offered for a class in a given term.
    #[must_use]
    pub fn subjects(&self, class_id: ClassId, term_id: TermId) -> Vec<&Subject> {
        self.subjects
            .iter()
            .filter(|s| s.class_id == class_id && s.term_id == term_id)
            .collect()
    }

    #[must_use]
    pub fn topics(&self, class_id: ClassId, term_id: TermId, subject_id: SubjectId) -> Vec<&Topic> {
        self.topics
            .iter()
            .filter(|t| t.class_id == class_id && t.term_id == term_id && t.subject_id == subject_id)
            .collect()
    }

    /// Questions for a full selection key.
    #[must_use]
    pub fn questions(&self, key: SelectionKey) -> Vec<&Question> {
        self.questions.iter().filter(|q| q.matches(key)).collect()
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}
