//! Attribute Composition
//!
//! Builds the replacement map for one generation: weighted draws per
//! attribute category with literal fallbacks, species-class hair
//! adaptation for aliens, and the race feature table for adventurers.
//!
//! Filling only inserts keys that are absent, so callers seed the map
//! with explicit overrides first and the draws respect them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::random;
use super::template::{Replacement, Replacements};
use crate::database::{AttributeOps, Database};

// ============================================================================
// Species Classes
// ============================================================================

/// Alien species classification driving hair/appearance adaptation.
///
/// Closed set: anything not recognized maps to `Exotic`, which carries its
/// own appearance table rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeciesClass {
    Humanoid,
    Mammalian,
    Necroid,
    Avian,
    Plantoid,
    Machine,
    Exotic,
}

impl SpeciesClass {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "humanoid" => Self::Humanoid,
            "mammalian" => Self::Mammalian,
            "necroid" => Self::Necroid,
            "avian" => Self::Avian,
            "plantoid" => Self::Plantoid,
            "machine" => Self::Machine,
            _ => Self::Exotic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Humanoid => "Humanoid",
            Self::Mammalian => "Mammalian",
            Self::Necroid => "Necroid",
            Self::Avian => "Avian",
            Self::Plantoid => "Plantoid",
            Self::Machine => "Machine",
            Self::Exotic => "Exotic",
        }
    }
}

impl fmt::Display for SpeciesClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PLANTOID_HAIR_COLORS: &[&str] = &["green", "brown", "yellow", "red", "orange"];
const EXOTIC_HAIR_COLORS: &[&str] = &["iridescent", "bioluminescent", "crystalline", "ethereal"];

// ============================================================================
// Race Features
// ============================================================================

/// Candidate feature phrases per adventurer race.
///
/// Races absent from the table produce an empty feature sentence.
fn race_feature_candidates(race: &str) -> &'static [&'static str] {
    match race.trim().to_lowercase().as_str() {
        "dragonkin" => &[
            "curling dragon horns",
            "fine iridescent scales along the jaw",
            "faintly smoking nostrils",
            "slit draconic pupils",
        ],
        "dwarf" => &[
            "an intricately braided beard",
            "a broad weathered face",
            "knotted forearms",
            "clan tattoos across the knuckles",
        ],
        "elf" => &[
            "long tapered ears",
            "sharp angular features",
            "an ageless unlined face",
            "a watchful distant gaze",
        ],
        "tiefling" => &[
            "sweeping curved horns",
            "a sinuous tail",
            "skin with a dusky crimson cast",
            "solid-colored eyes without pupils",
        ],
        "orc" => &[
            "prominent lower tusks",
            "a heavy scarred brow",
            "gray-green skin",
            "ritual scarification down one arm",
        ],
        "human" => &[
            "sun-weathered skin",
            "a friendly open face",
            "calloused practical hands",
            "an easy confident smile",
        ],
        "halfling" => &[
            "a round cheerful face",
            "curly hair over large ears",
            "bare leathery feet",
        ],
        "gnome" => &[
            "a wild shock of hair",
            "bright oversized eyes",
            "a nose dusted with soot",
        ],
        _ => &[],
    }
}

/// Draw 1-2 feature phrases for a race and join them into a sentence.
pub fn race_feature_sentence(race: &str) -> String {
    let candidates = race_feature_candidates(race);
    if candidates.is_empty() {
        return String::new();
    }

    let count = random::random_int(1, 2) as usize;
    let picked = random::pick_many(candidates, count);
    format!("Heritage shows in {}.", picked.join(" and "))
}

// ============================================================================
// Composer
// ============================================================================

/// Draws weighted attributes from the catalog into a replacement map.
pub struct AttributeComposer<'a> {
    db: &'a Database,
}

impl<'a> AttributeComposer<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// One weighted draw from a category, or the literal fallback when the
    /// category is empty.
    pub async fn draw(&self, category: &str, fallback: &str) -> Result<String, sqlx::Error> {
        let picked = self.db.get_random_by_category(category, 1).await?;
        Ok(picked
            .first()
            .map(|o| o.output_value().to_string())
            .unwrap_or_else(|| fallback.to_string()))
    }

    async fn fill(
        &self,
        replacements: &mut Replacements,
        key: &str,
        category: &str,
        fallback: &str,
    ) -> Result<(), sqlx::Error> {
        if !replacements.contains_key(key) {
            let value = self.draw(category, fallback).await?;
            replacements.insert(key.to_string(), Replacement::Text(value));
        }
        Ok(())
    }

    /// Base attributes drawn for every generator flow.
    pub async fn fill_base(&self, replacements: &mut Replacements) -> Result<(), sqlx::Error> {
        self.fill(replacements, "gender", "gender", "female").await?;
        self.fill(replacements, "hair_color", "hair_colors", "brown").await?;
        self.fill(replacements, "hair_style", "hair_styles", "long").await?;
        self.fill(replacements, "skin_color", "skin_colors", "fair").await?;
        self.fill(replacements, "eye_color", "eye_colors", "blue").await?;
        self.fill(replacements, "eye_expression", "eye_expressions", "a gentle")
            .await?;
        self.fill(replacements, "background", "backgrounds", "a plain backdrop")
            .await?;
        self.fill(replacements, "pose", "poses", "standing").await?;

        if !replacements.contains_key("facial_features") {
            let count = random::random_int(1, 3) as usize;
            let features = self.db.get_random_by_category("facial_features", count).await?;
            let features: Vec<String> = if features.is_empty() {
                vec!["a calm expression".to_string()]
            } else {
                features.iter().map(|o| o.output_value().to_string()).collect()
            };
            replacements.insert("facial_features".to_string(), Replacement::List(features));
        }

        if !replacements.contains_key("accessory") {
            let accessory = if random::chance(0.5) {
                self.draw("accessories", "").await?
            } else {
                String::new()
            };
            replacements.insert("accessory".to_string(), Replacement::Text(accessory));
        }

        Ok(())
    }

    /// Extended attributes used by the anime and base flows.
    pub async fn fill_extended(&self, replacements: &mut Replacements) -> Result<(), sqlx::Error> {
        self.fill(replacements, "artistic_style", "artistic_styles", "anime")
            .await?;
        self.fill(replacements, "environment", "environments", "fantasy background")
            .await?;
        self.fill(replacements, "cultural_artifact", "cultural_artifacts", "simple item")
            .await?;
        self.fill(replacements, "clothing", "clothing", "simple clothing").await?;
        Ok(())
    }

    /// Force class-specific hair entries before the base fill so the
    /// normal draws skip them. Humanoid-like classes leave both unset.
    pub fn adapt_for_species_class(replacements: &mut Replacements, class: SpeciesClass) {
        let forced: Option<(Option<&str>, &str)> = match class {
            SpeciesClass::Humanoid | SpeciesClass::Mammalian | SpeciesClass::Necroid => None,
            SpeciesClass::Avian => Some((None, "feathered crest")),
            SpeciesClass::Plantoid => Some((
                random::pick_one(PLANTOID_HAIR_COLORS).copied(),
                "leaf-like fronds",
            )),
            SpeciesClass::Machine => Some((Some("metallic"), "synthetic fibers")),
            SpeciesClass::Exotic => Some((
                random::pick_one(EXOTIC_HAIR_COLORS).copied(),
                "alien appendages",
            )),
        };

        if let Some((hair_color, hair_style)) = forced {
            if let Some(color) = hair_color {
                replacements
                    .entry("hair_color".to_string())
                    .or_insert_with(|| Replacement::Text(color.to_string()));
            }
            replacements.insert(
                "hair_style".to_string(),
                Replacement::Text(hair_style.to_string()),
            );
        }
    }
}
