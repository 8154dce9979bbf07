use std::sync::Arc;

use quiz_core::model::{SoundPreferences, SoundPreferencesDraft};
use storage::repository::PreferenceRepository;

use crate::error::QuizError;

const SOUND_KEY_PREFIX: &str = "sound_";

#[derive(Clone)]
pub struct SoundSettingsService {
    repo: Arc<dyn PreferenceRepository>,
}

impl SoundSettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn PreferenceRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted preferences; missing or invalid keys use defaults.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on storage failures.
    pub async fn load(&self) -> Result<SoundPreferences, QuizError> {
        let stored = self.repo.list_preferences(SOUND_KEY_PREFIX).await?;
        Ok(SoundPreferences::from_entries(|key| stored.get(key).cloned()))
    }

    /// Validate `draft` over the current preferences and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InputValidation` if validation fails, or
    /// `QuizError::Storage` if persistence fails.
    pub async fn save(&self, draft: SoundPreferencesDraft) -> Result<SoundPreferences, QuizError> {
        let current = self.load().await?;
        let prefs = draft.apply_to(current)?;
        self.repo.set_preferences(&prefs.to_entries()).await?;
        Ok(prefs)
    }
}
