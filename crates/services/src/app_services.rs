use std::sync::Arc;

use storage::content::ContentDocument;
use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::explanation::{
    AskService, DisabledExplanations, ExplanationProvider, GenerativeExplanationService,
};
use crate::scores::ScoreService;
use crate::sessions::QuizLoopService;
use crate::sound_settings_service::SoundSettingsService;

/// Remote providers wired into the app.
#[derive(Clone)]
pub struct Providers {
    pub explanations: Arc<dyn ExplanationProvider>,
    pub ask: Arc<AskService>,
}

impl Providers {
    /// Gemini for explanations when `GOOGLE_API_KEY` is set, else the
    /// inference endpoint when a Hugging Face token is set.
    #[must_use]
    pub fn from_env() -> Self {
        let generative = GenerativeExplanationService::from_env();
        let ask = AskService::from_env();
        let explanations: Arc<dyn ExplanationProvider> = if generative.enabled() {
            Arc::new(generative)
        } else if ask.enabled() {
            Arc::new(ask.clone())
        } else {
            Arc::new(generative)
        };
        Self {
            explanations,
            ask: Arc::new(ask),
        }
    }

    /// Providers that fail every request.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            explanations: Arc::new(DisabledExplanations),
            ask: Arc::new(AskService::new(None)),
        }
    }
}

/// Assembles app-facing services around one storage backend and catalog.
#[derive(Clone)]
pub struct AppServices {
    storage_backend: &'static str,
    imported_scores: usize,
    catalog: Arc<CatalogService>,
    scores: Arc<ScoreService>,
    sound_settings: Arc<SoundSettingsService>,
    quiz_loop: Arc<QuizLoopService>,
    providers: Providers,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the score
    /// import fails.
    pub async fn new_sqlite(
        db_url: &str,
        content: ContentDocument,
        clock: Clock,
        providers: Providers,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, "sqlite", content, clock, providers).await
    }

    /// Build services over in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the score import fails.
    pub async fn new_in_memory(
        content: ContentDocument,
        clock: Clock,
        providers: Providers,
    ) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), "memory", content, clock, providers).await
    }

    async fn from_storage(
        storage: Storage,
        storage_backend: &'static str,
        content: ContentDocument,
        clock: Clock,
        providers: Providers,
    ) -> Result<Self, AppServicesError> {
        let catalog = Arc::new(CatalogService::new(content.catalog));
        let scores = Arc::new(ScoreService::new(Arc::clone(&storage.scores)));
        let imported_scores = scores.import(&content.scores).await?;
        let sound_settings = Arc::new(SoundSettingsService::new(Arc::clone(&storage.preferences)));
        let quiz_loop = Arc::new(QuizLoopService::new(
            clock,
            Arc::clone(&catalog),
            Arc::clone(&providers.explanations),
            Arc::clone(&scores),
        ));

        info!(
            storage = storage_backend,
            questions = catalog.catalog().question_count(),
            imported_scores,
            skipped_scores = content.skipped_scores,
            explanations = providers.explanations.name(),
            "services ready"
        );

        Ok(Self {
            storage_backend,
            imported_scores,
            catalog,
            scores,
            sound_settings,
            quiz_loop,
            providers,
        })
    }

    #[must_use]
    pub fn storage_backend(&self) -> &'static str {
        self.storage_backend
    }

    /// Bundled scores newly stored at startup.
    #[must_use]
    pub fn imported_scores(&self) -> usize {
        self.imported_scores
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn scores(&self) -> Arc<ScoreService> {
        Arc::clone(&self.scores)
    }

    #[must_use]
    pub fn sound_settings(&self) -> Arc<SoundSettingsService> {
        Arc::clone(&self.sound_settings)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn explanations(&self) -> Arc<dyn ExplanationProvider> {
        Arc::clone(&self.providers.explanations)
    }

    #[must_use]
    pub fn ask(&self) -> Arc<AskService> {
        Arc::clone(&self.providers.ask)
    }
}
