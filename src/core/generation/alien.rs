//! Alien Prompt Generation
//!
//! Alien flow: random species, species-class hair adaptation, trait and
//! climate draws with caller overrides, and persistence of every
//! successful item as a stored prompt record.

use super::{
    build_tags, resolve_template, validate_count, BatchOutcome, GenerationError, ImagePrompt,
    Result,
};
use crate::core::compose::{AttributeComposer, SpeciesClass};
use crate::core::template::{self, GeneratorType, Replacement, Replacements};
use crate::database::{Database, GeneratedPromptRecord, PromptOps, SpeciesOps, SpeciesRecord};
use serde::Deserialize;
use tracing::debug;

/// Standard negative prompt when the species carries no override.
const ALIEN_NEGATIVE_PROMPT: &str =
    "blurry, low quality, distorted anatomy, extra limbs, text, watermark";

/// Request for a batch of alien prompts. All attribute fields are
/// optional overrides; anything absent is drawn from the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlienRequest {
    pub count: i64,
    #[serde(default)]
    pub species_class: Option<String>,
    #[serde(default)]
    pub climate: Option<String>,
    #[serde(default)]
    pub positive_trait: Option<String>,
    #[serde(default)]
    pub negative_trait: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
}

/// Generates alien prompts and persists each success.
#[derive(Clone)]
pub struct AlienGenerationService {
    db: Database,
}

impl AlienGenerationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Generate `count` prompts; successes are stored before they are
    /// returned.
    pub async fn generate_batch(&self, request: &AlienRequest) -> Result<BatchOutcome> {
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

    async fn generate_one(&self, request: &AlienRequest) -> Result<ImagePrompt> {
        let species = self
            .db
            .random_by_type("alien")
            .await?
            .ok_or_else(|| GenerationError::NoSpeciesAvailable("alien".to_string()))?;

        let class_tag = request
            .species_class
            .clone()
            .or_else(|| species.species_class.clone())
            .unwrap_or_default();
        let species_class = SpeciesClass::parse(&class_tag);
        debug!(species = %species.name, class = %species_class, "Generating alien prompt");

        let mut replacements = Replacements::new();
        apply_overrides(&mut replacements, request);

        // Class adaptation runs before the base fill so forced hair
        // entries win over catalog draws.
        AttributeComposer::adapt_for_species_class(&mut replacements, species_class);

        let composer = AttributeComposer::new(&self.db);
        composer.fill_base(&mut replacements).await?;

        if !replacements.contains_key("climate") {
            let climate = match species.climate.clone().filter(|c| !c.is_empty()) {
                Some(climate) => climate,
                None => composer.draw("climates", "temperate").await?,
            };
            replacements.insert("climate".to_string(), Replacement::Text(climate));
        }
        if !replacements.contains_key("positive_trait") {
            let value = composer.draw("positive_traits", "adaptable").await?;
            replacements.insert("positive_trait".to_string(), Replacement::Text(value));
        }
        if !replacements.contains_key("negative_trait") {
            let value = composer.draw("negative_traits", "proud").await?;
            replacements.insert("negative_trait".to_string(), Replacement::Text(value));
        }
        if !replacements.contains_key("style") {
            let value = composer.draw("artistic_styles", "digital painting").await?;
            replacements.insert("style".to_string(), Replacement::Text(value));
        }
        if !replacements.contains_key("environment") {
            let value = composer.draw("environments", "an alien landscape").await?;
            replacements.insert("environment".to_string(), Replacement::Text(value));
        }

        insert_species_entries(&mut replacements, &species, species_class);

        let template_str =
            resolve_template(&self.db, GeneratorType::Alien, request.template_id.as_deref())
                .await?;
        let description = template::render(&template_str, &replacements);

        let tags = build_tags([
            replacements["gender"].render(),
            replacements["hair_color"].render(),
            replacements["eye_color"].render(),
            species.name.clone(),
            species_class.as_str().to_string(),
            replacements["positive_trait"].render(),
            replacements["negative_trait"].render(),
            replacements["style"].render(),
            replacements["environment"].render(),
        ]);

        let negative_prompt = species
            .negative_prompt
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| ALIEN_NEGATIVE_PROMPT.to_string());

        let record = GeneratedPromptRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: format!("{} of the {} worlds", species.name, replacements["climate"].render()),
            description,
            negative_prompt,
            tags_json: serde_json::to_string(&tags).unwrap_or_else(|_| "[]".to_string()),
            species_id: Some(species.id.clone()),
            prompt_type: "alien".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.db.save_prompt(&record).await?;

        Ok(ImagePrompt {
            id: record.id,
            title: record.title,
            description: record.description,
            negative_prompt: record.negative_prompt,
            tags,
        })
    }
}

fn apply_overrides(replacements: &mut Replacements, request: &AlienRequest) {
    let overrides = [
        ("gender", &request.gender),
        ("climate", &request.climate),
        ("positive_trait", &request.positive_trait),
        ("negative_trait", &request.negative_trait),
        ("style", &request.style),
        ("environment", &request.environment),
    ];
    for (key, value) in overrides {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            replacements.insert(key.to_string(), Replacement::from(value));
        }
    }
}

fn insert_species_entries(
    replacements: &mut Replacements,
    species: &SpeciesRecord,
    species_class: SpeciesClass,
) {
    replacements.insert("species".to_string(), Replacement::from(species.name.clone()));
    replacements.insert(
        "species_class".to_string(),
        Replacement::from(species_class.as_str()),
    );

    let features = species.features();
    if !features.is_empty() {
        replacements.insert("species_features".to_string(), Replacement::List(features));
    }
}
