//! Generation Services
//!
//! Top-level use cases, one per generator type. Each single-item flow
//! resolves a species/class, composes weighted attributes, renders the
//! description template, and assembles tags plus a negative prompt.
//! Batch requests repeat the single-item flow and collect per-item
//! failures without aborting the batch.

pub mod adventurer;
pub mod alien;
pub mod anime;

pub use adventurer::{AdventurerGenerationService, AdventurerRequest, ExperienceTier};
pub use alien::{AlienGenerationService, AlienRequest};
pub use anime::{AnimeGenerationService, AnimePromptRequest};

use serde::Serialize;
use thiserror::Error;

use super::template::GeneratorType;
use crate::database::{Database, TemplateOps};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while generating a prompt
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No species available for type {0}")]
    NoSpeciesAvailable(String),

    #[error("{entity} not found: {name}")]
    NotFound { entity: &'static str, name: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Store(#[from] crate::database::StoreError),
}

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, GenerationError>;

// ============================================================================
// Batch Handling
// ============================================================================

/// Inclusive bounds for a batch `count`.
pub const MIN_COUNT: i64 = 1;
pub const MAX_COUNT: i64 = 50;

/// Validate a batch count before any generation work happens.
pub fn validate_count(count: i64) -> Result<usize> {
    if !(MIN_COUNT..=MAX_COUNT).contains(&count) {
        return Err(GenerationError::Validation(format!(
            "count must be between {MIN_COUNT} and {MAX_COUNT}, got {count}"
        )));
    }
    Ok(count as usize)
}

/// One generated prompt as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ImagePrompt {
    pub id: String,
    pub title: String,
    pub description: String,
    pub negative_prompt: String,
    pub tags: Vec<String>,
}

/// Batch result: successful items plus index-tagged failure messages.
///
/// A batch with zero successes is still an ordinary result; callers
/// inspect `errors`, not a transport status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub items: Vec<ImagePrompt>,
    pub errors: Vec<String>,
}

impl BatchOutcome {
    pub(crate) fn record_failure(&mut self, index: usize, error: &GenerationError) {
        tracing::warn!(index, %error, "Batch item failed");
        self.errors.push(format!("Item {index}: {error}"));
    }
}

/// Build the tag list from attribute fields, dropping empties. Order is
/// the caller's field order, so identical inputs tag identically.
pub(crate) fn build_tags<I>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    fields.into_iter().filter(|f| !f.trim().is_empty()).collect()
}

// ============================================================================
// Template Resolution
// ============================================================================

/// Resolve the template string for a generation.
///
/// Precedence: explicit id (must be active and match the generator type),
/// then the stored default, then the hardcoded per-type fallback.
pub(crate) async fn resolve_template(
    db: &Database,
    generator_type: GeneratorType,
    template_id: Option<&str>,
) -> Result<String> {
    if let Some(id) = template_id {
        if let Some(stored) = db.get_template(id).await? {
            if stored.is_active && stored.generator_type == generator_type.as_str() {
                return Ok(stored.template);
            }
        }
    }

    if let Some(default) = db.default_template(generator_type.as_str()).await? {
        return Ok(default.template);
    }

    Ok(generator_type.fallback_template().to_string())
}
