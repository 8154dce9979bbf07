use std::path::Path;

use quiz_core::model::{Catalog, CatalogDraft, CatalogError, ScoreRecord};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("failed to read content file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("content is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// A loaded content file: the validated catalog plus any bundled scores.
#[derive(Debug, Clone)]
pub struct ContentDocument {
    pub catalog: Catalog,
    pub scores: Vec<ScoreRecord>,
    /// Bundled score entries that failed validation and were dropped.
    pub skipped_scores: usize,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(flatten)]
    catalog: CatalogDraft,
    #[serde(default)]
    scores: Vec<serde_json::Value>,
}

impl ContentDocument {
    /// Parse a content document.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Parse` for malformed JSON and
    /// `ContentError::Catalog` when the hierarchy does not validate. Invalid
    /// score entries are counted in `skipped_scores` instead of failing.
    pub fn from_json_str(raw: &str) -> Result<Self, ContentError> {
        let doc: RawDocument = serde_json::from_str(raw)?;
        let catalog = doc.catalog.validate()?;

        let total = doc.scores.len();
        let scores: Vec<ScoreRecord> = doc
            .scores
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();
        let skipped_scores = total - scores.len();

        Ok(Self {
            catalog,
            scores,
            skipped_scores,
        })
    }
}

/// Read and parse a content file from disk.
///
/// # Errors
///
/// Returns `ContentError::Io` if the file cannot be read, otherwise the
/// errors of [`ContentDocument::from_json_str`].
pub async fn load_content_file(path: impl AsRef<Path>) -> Result<ContentDocument, ContentError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        })?;
    ContentDocument::from_json_str(&raw)
}
