mod catalog;
mod ids;
mod question;
mod score;
mod selection;
mod sound;

pub use ids::{ClassId, ParseIdError, QuestionId, SubjectId, TermId, TopicId};

pub use catalog::{Catalog, CatalogDraft, CatalogError, ClassLevel, Subject, Term, Topic};
pub use question::{OptionDraft, Question, QuestionDraft, QuestionError};
pub use score::{Percentage, Remark, ScoreDraft, ScoreError, ScoreRecord, iso_millis};
pub use selection::{SelectionDraft, SelectionError, SelectionKey};
pub use sound::{
    MUTED_KEY, SoundChoice, SoundEvent, SoundPreferences, SoundPreferencesDraft,
    SoundPreferencesError, VOLUME_KEY,
};
