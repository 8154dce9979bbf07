use thiserror::Error;

use crate::model::{CatalogError, QuestionError, ScoreError, SelectionError, SoundPreferencesError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    SoundPreferences(#[from] SoundPreferencesError),
}
