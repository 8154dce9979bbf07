use std::sync::Arc;

use quiz_core::model::{
    Catalog, ClassLevel, Question, SelectionDraft, SelectionKey, Subject, SubjectId, Term, Topic,
    TopicId,
};

use crate::error::QuizError;

/// Read-only access to the content hierarchy.
#[derive(Clone, Debug, Default)]
pub struct CatalogService {
    catalog: Arc<Catalog>,
}

impl CatalogService {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn classes(&self) -> &[ClassLevel] {
        self.catalog.classes()
    }

    #[must_use]
    pub fn terms(&self) -> &[Term] {
        self.catalog.terms()
    }

    /// Subjects for the class and term in `draft`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InputValidation` if `classId` or `termId` is
    /// missing or not numeric.
    pub fn subjects(&self, draft: &SelectionDraft) -> Result<Vec<&Subject>, QuizError> {
        let (class_id, term_id) = draft.validate_term_scope()?;
        Ok(self.catalog.subjects(class_id, term_id))
    }

    /// Topics for the class, term and subject in `draft`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InputValidation` if a required key is missing or
    /// not numeric.
    pub fn topics(&self, draft: &SelectionDraft) -> Result<Vec<&Topic>, QuizError> {
        let (class_id, term_id, subject_id) = draft.validate_subject_scope()?;
        Ok(self.catalog.topics(class_id, term_id, subject_id))
    }

    /// Questions for a full selection; may be empty.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InputValidation` naming the first missing key.
    pub fn questions(&self, draft: &SelectionDraft) -> Result<Vec<&Question>, QuizError> {
        let key = draft.validate()?;
        Ok(self.catalog.questions(key))
    }

    /// Owned questions for starting a session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` when the selection has no questions.
    pub fn questions_for(&self, key: SelectionKey) -> Result<Vec<Question>, QuizError> {
        let questions: Vec<Question> = self.catalog.questions(key).into_iter().cloned().collect();
        if questions.is_empty() {
            return Err(QuizError::NotFound(format!(
                "no questions for selection {key}"
            )));
        }
        Ok(questions)
    }

    /// # Errors
    ///
    /// Returns `QuizError::NotFound` for unknown ids.
    pub fn subject(&self, id: SubjectId) -> Result<&Subject, QuizError> {
        self.catalog
            .subject(id)
            .ok_or_else(|| QuizError::NotFound(format!("subject {id} not found")))
    }

    /// # Errors
    ///
    /// Returns `QuizError::NotFound` for unknown ids.
    pub fn topic(&self, id: TopicId) -> Result<&Topic, QuizError> {
        self.catalog
            .topic(id)
            .ok_or_else(|| QuizError::NotFound(format!("topic {id} not found")))
    }

    /// Display names for a selection, empty when unknown.
    #[must_use]
    pub fn display_names(&self, key: SelectionKey) -> (String, String) {
        let subject = self
            .catalog
            .subject(key.subject_id)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let topic = self
            .catalog
            .topic(key.topic_id)
            .map(|t| t.name.clone())
            .unwrap_or_default();
        (subject, topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{CatalogDraft, ClassId, TermId};

    fn service() -> CatalogService {
        let draft: CatalogDraft = serde_json::from_value(serde_json::json!({
            "classes": [{ "id": 1, "name": "Primary 1" }],
            "terms": [{ "id": 1, "name": "First Term" }],
            "subjects": [{ "id": 2, "classId": 1, "termId": 1, "name": "Mathematics" }],
            "topics": [{ "id": 5, "classId": 1, "termId": 1, "subjectId": 2, "name": "Addition" }],
            "questions": [{
                "id": 1, "classId": 1, "termId": 1, "subjectId": 2, "topicId": 5,
                "question": "1 + 1?", "options": ["1", "2"], "correctAnswer": "2"
            }]
        }))
        .unwrap();
        CatalogService::new(draft.validate().unwrap())
    }

    fn draft(class: &str, term: &str, subject: Option<&str>, topic: Option<&str>) -> SelectionDraft {
        SelectionDraft {
            class_id: Some(class.into()),
            term_id: Some(term.into()),
            subject_id: subject.map(Into::into),
            topic_id: topic.map(Into::into),
        }
    }

    #[test]
    fn lists_follow_hierarchy() {
        let svc = service();
        assert_eq!(svc.subjects(&draft("1", "1", None, None)).unwrap().len(), 1);
        assert_eq!(svc.topics(&draft("1", "1", Some("2"), None)).unwrap().len(), 1);
        assert_eq!(
            svc.questions(&draft("1", "1", Some("2"), Some("5")))
                .unwrap()
                .len(),
            1
        );
        assert!(svc
            .questions(&draft("1", "1", Some("2"), Some("6")))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn missing_keys_are_input_errors() {
        let svc = service();
        let err = svc.questions(&draft("1", "1", Some("2"), None)).unwrap_err();
        assert!(matches!(err, QuizError::InputValidation(ref m) if m.contains("topicId")));
    }

    #[test]
    fn empty_selection_is_not_found() {
        let svc = service();
        let key = SelectionKey::new(ClassId::new(1), TermId::new(1), SubjectId::new(2), TopicId::new(9));
        assert!(matches!(svc.questions_for(key), Err(QuizError::NotFound(_))));
        assert!(matches!(svc.topic(TopicId::new(9)), Err(QuizError::NotFound(_))));
        assert_eq!(
            svc.display_names(SelectionKey::new(
                ClassId::new(1),
                TermId::new(1),
                SubjectId::new(2),
                TopicId::new(5)
            )),
            ("Mathematics".to_owned(), "Addition".to_owned())
        );
    }
}
