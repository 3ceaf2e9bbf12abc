//! Anime Prompt Generation
//!
//! The general prompt flow behind `POST /prompts/generate`: pick a species
//! for the requested type (or look one up by name), compose base and
//! extended attributes, and render the description template. Results are
//! returned directly, not persisted.

use super::{
    build_tags, resolve_template, validate_count, BatchOutcome, GenerationError, ImagePrompt,
    Result,
};
use crate::core::compose::AttributeComposer;
use crate::core::template::{self, GeneratorType, Replacement, Replacements};
use crate::database::{Database, SpeciesOps, SpeciesRecord};
use serde::Deserialize;
use tracing::debug;

/// Standard negative prompt when the species carries no override.
const ANIME_NEGATIVE_PROMPT: &str =
    "lowres, bad anatomy, bad hands, extra digits, worst quality, blurry, jpeg artifacts";

/// Request for a batch of general character prompts.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimePromptRequest {
    pub count: i64,
    /// Species type to draw from ("anime", "base", ...).
    #[serde(rename = "type", default = "default_type")]
    pub species_type: String,
    /// Optional named species instead of a random pick.
    #[serde(default)]
    pub species: Option<String>,
    /// Optional explicit template id.
    #[serde(default)]
    pub template_id: Option<String>,
}

fn default_type() -> String {
    "anime".to_string()
}

/// Generates anime/base-style character prompts.
#[derive(Clone)]
pub struct AnimeGenerationService {
    db: Database,
}

impl AnimeGenerationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Generate `count` prompts, collecting per-item failures.
    pub async fn generate_batch(&self, request: &AnimePromptRequest) -> Result<BatchOutcome> {
        let count = validate_count(request.count)?;

        let mut outcome = BatchOutcome::default();
        for index in 1..=count {
            match self.generate_one(request).await {
                Ok(item) => outcome.items.push(item),
                Err(error) => outcome.record_failure(index, &error),
            }
        }
        Ok(outcome)
    }

    async fn generate_one(&self, request: &AnimePromptRequest) -> Result<ImagePrompt> {
        let species = self.resolve_species(request).await?;
        debug!(species = %species.name, "Generating anime prompt");

        let mut replacements = Replacements::new();
        insert_species_entries(&mut replacements, &species);

        let composer = AttributeComposer::new(&self.db);
        composer.fill_base(&mut replacements).await?;
        composer.fill_extended(&mut replacements).await?;

        let generator_type =
            GeneratorType::parse(&request.species_type).unwrap_or(GeneratorType::Anime);
        let template_str =
            resolve_template(&self.db, generator_type, request.template_id.as_deref()).await?;
        let description = template::render(&template_str, &replacements);

        let gender = replacements["gender"].render();
        let hair_color = replacements["hair_color"].render();
        let tags = build_tags([
            gender.clone(),
            hair_color.clone(),
            replacements["eye_color"].render(),
            species.name.clone(),
            replacements["artistic_style"].render(),
            replacements["environment"].render(),
        ]);

        let negative_prompt = species
            .negative_prompt
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| ANIME_NEGATIVE_PROMPT.to_string());

        Ok(ImagePrompt {
            id: uuid::Uuid::new_v4().to_string(),
            title: format!("{} {} with {} hair", capitalize(&gender), species.name, hair_color),
            description,
            negative_prompt,
            tags,
        })
    }

    async fn resolve_species(&self, request: &AnimePromptRequest) -> Result<SpeciesRecord> {
        if let Some(name) = request.species.as_deref().filter(|n| !n.trim().is_empty()) {
            return self
                .db
                .find_by_name_and_type(name, &request.species_type)
                .await?
                .ok_or_else(|| GenerationError::NotFound {
                    entity: "species",
                    name: name.to_string(),
                });
        }

        self.db
            .random_by_type(&request.species_type)
            .await?
            .ok_or_else(|| GenerationError::NoSpeciesAvailable(request.species_type.clone()))
    }
}

/// Insert species-derived entries into the replacement map.
fn insert_species_entries(replacements: &mut Replacements, species: &SpeciesRecord) {
    replacements.insert("species".to_string(), Replacement::from(species.name.clone()));

    let mut features = species.features();
    for extra in [&species.ears, &species.tail, &species.wings] {
        if let Some(extra) = extra.as_deref().filter(|e| !e.is_empty()) {
            if !features.iter().any(|f| f == extra) {
                features.push(extra.to_string());
            }
        }
    }
    if features.is_empty() {
        features.push("no unusual features".to_string());
    }
    replacements.insert("species_features".to_string(), Replacement::List(features));

    let personality = species.personality();
    if !personality.is_empty() {
        replacements.insert("personality".to_string(), Replacement::List(personality));
    }
    let descriptors = species.visual_descriptors();
    if !descriptors.is_empty() {
        replacements.insert("visual_descriptors".to_string(), Replacement::List(descriptors));
    }
    for (key, value) in [
        ("ears", &species.ears),
        ("tail", &species.tail),
        ("wings", &species.wings),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            replacements.insert(key.to_string(), Replacement::from(value));
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(count: i64) -> AnimePromptRequest {
        AnimePromptRequest {
            count,
            species_type: "anime".to_string(),
            species: None,
            template_id: None,
        }
    }

    #[tokio::test]
    async fn batch_of_three_generates_three() {
        let db = Database::in_memory().await.unwrap();
        let service = AnimeGenerationService::new(db);
        let outcome = service.generate_batch(&request(3)).await.unwrap();
        assert_eq!(outcome.items.len(), 3);
        assert!(outcome.errors.is_empty());

        for item in &outcome.items {
            assert!(!item.description.is_empty());
            assert!(!item.tags.is_empty());
            assert!(!item.negative_prompt.is_empty());
        }
    }

    #[tokio::test]
    async fn count_out_of_bounds_rejected_before_generation() {
        let db = Database::in_memory().await.unwrap();
        let service = AnimeGenerationService::new(db);
        let err = service.generate_batch(&request(51)).await.unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
    }

    #[tokio::test]
    async fn named_species_is_used() {
        let db = Database::in_memory().await.unwrap();
        let service = AnimeGenerationService::new(db);
        let mut req = request(1);
        req.species = Some("Kitsune".to_string());
        let outcome = service.generate_batch(&req).await.unwrap();
        assert!(outcome.items[0].tags.contains(&"Kitsune".to_string()));
    }

    #[tokio::test]
    async fn missing_type_yields_item_errors_not_failure() {
        let db = Database::in_memory().await.unwrap();
        let service = AnimeGenerationService::new(db);
        let mut req = request(5);
        req.species_type = "mecha".to_string();
        let outcome = service.generate_batch(&req).await.unwrap();
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.errors.len(), 5);
        assert!(outcome.errors[0].contains("Item 1"));
        assert!(outcome.errors[0].contains("mecha"));
    }

    #[tokio::test]
    async fn unknown_named_species_is_item_error() {
        let db = Database::in_memory().await.unwrap();
        let service = AnimeGenerationService::new(db);
        let mut req = request(2);
        req.species = Some("Slimegirl".to_string());
        let outcome = service.generate_batch(&req).await.unwrap();
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.errors.len(), 2);
    }
}
