//! Description Template Engine
//!
//! Templates are plain strings containing `{placeholder}` tokens. Each
//! generator type declares a placeholder whitelist used to validate
//! user-edited templates, and carries a hardcoded fallback template used
//! when the store has neither the requested template nor a default.
//!
//! Rendering substitutes a replacement map into the template. Tokens with
//! no matching key are left literally in the output (catalog consumers
//! depend on seeing the unresolved token rather than an empty hole).
//! Pronoun tokens are injected from the map's `gender` entry before
//! substitution.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::pronouns::{pronouns_for, Pronouns};

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder regex"));

// ============================================================================
// Generator Types
// ============================================================================

/// Top-level kind of subject being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorType {
    Adventurer,
    Alien,
    Anime,
    Base,
}

impl GeneratorType {
    pub const ALL: [GeneratorType; 4] = [
        GeneratorType::Adventurer,
        GeneratorType::Alien,
        GeneratorType::Anime,
        GeneratorType::Base,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adventurer => "adventurer",
            Self::Alien => "alien",
            Self::Anime => "anime",
            Self::Base => "base",
        }
    }

    /// Parse from a stored/user-supplied string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "adventurer" => Some(Self::Adventurer),
            "alien" => Some(Self::Alien),
            "anime" => Some(Self::Anime),
            "base" => Some(Self::Base),
            _ => None,
        }
    }

    /// Placeholders every template of this type may use.
    pub fn placeholder_whitelist(&self) -> &'static [&'static str] {
        match self {
            Self::Base => BASE_PLACEHOLDERS,
            Self::Anime => ANIME_PLACEHOLDERS,
            Self::Alien => ALIEN_PLACEHOLDERS,
            Self::Adventurer => ADVENTURER_PLACEHOLDERS,
        }
    }

    /// Attribute categories this type's flow draws from.
    pub fn attribute_categories(&self) -> &'static [&'static str] {
        match self {
            Self::Base | Self::Anime => BASE_CATEGORIES,
            Self::Alien => ALIEN_CATEGORIES,
            Self::Adventurer => ADVENTURER_CATEGORIES,
        }
    }

    /// Hardcoded fallback template used when the store has nothing.
    pub fn fallback_template(&self) -> &'static str {
        match self {
            Self::Base => BASE_FALLBACK,
            Self::Anime => ANIME_FALLBACK,
            Self::Alien => ALIEN_FALLBACK,
            Self::Adventurer => ADVENTURER_FALLBACK,
        }
    }
}

impl fmt::Display for GeneratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BASE_CATEGORIES: &[&str] = &[
    "gender",
    "hair_colors",
    "hair_styles",
    "skin_colors",
    "eye_colors",
    "eye_expressions",
    "backgrounds",
    "poses",
    "facial_features",
    "accessories",
    "artistic_styles",
    "environments",
    "cultural_artifacts",
    "clothing",
];

const ALIEN_CATEGORIES: &[&str] = &[
    "gender",
    "hair_colors",
    "hair_styles",
    "skin_colors",
    "eye_colors",
    "eye_expressions",
    "backgrounds",
    "poses",
    "facial_features",
    "accessories",
    "climates",
    "positive_traits",
    "negative_traits",
    "artistic_styles",
    "environments",
];

const ADVENTURER_CATEGORIES: &[&str] = &[
    "gender",
    "hair_colors",
    "hair_styles",
    "skin_colors",
    "eye_colors",
    "eye_expressions",
    "backgrounds",
    "poses",
    "facial_features",
    "accessories",
    "races",
];

const BASE_PLACEHOLDERS: &[&str] = &[
    "gender",
    "hair_color",
    "hair_style",
    "skin_color",
    "eye_color",
    "eye_expression",
    "background",
    "pose",
    "facial_features",
    "accessory",
    "artistic_style",
    "environment",
    "cultural_artifact",
    "clothing",
    "pronoun_subject",
    "pronoun_object",
    "pronoun_possessive",
    "pronoun_reflexive",
    "pronoun_subject_cap",
    "pronoun_object_cap",
    "pronoun_possessive_cap",
    "pronoun_reflexive_cap",
];

const ANIME_PLACEHOLDERS: &[&str] = &[
    "gender",
    "hair_color",
    "hair_style",
    "skin_color",
    "eye_color",
    "eye_expression",
    "background",
    "pose",
    "facial_features",
    "accessory",
    "artistic_style",
    "environment",
    "cultural_artifact",
    "clothing",
    "species",
    "species_features",
    "personality",
    "visual_descriptors",
    "ears",
    "tail",
    "wings",
    "pronoun_subject",
    "pronoun_object",
    "pronoun_possessive",
    "pronoun_reflexive",
    "pronoun_subject_cap",
    "pronoun_object_cap",
    "pronoun_possessive_cap",
    "pronoun_reflexive_cap",
];

const ALIEN_PLACEHOLDERS: &[&str] = &[
    "gender",
    "hair_color",
    "hair_style",
    "skin_color",
    "eye_color",
    "eye_expression",
    "background",
    "pose",
    "facial_features",
    "accessory",
    "species",
    "species_class",
    "species_features",
    "climate",
    "positive_trait",
    "negative_trait",
    "style",
    "environment",
    "pronoun_subject",
    "pronoun_object",
    "pronoun_possessive",
    "pronoun_reflexive",
    "pronoun_subject_cap",
    "pronoun_object_cap",
    "pronoun_possessive_cap",
    "pronoun_reflexive_cap",
];

const ADVENTURER_PLACEHOLDERS: &[&str] = &[
    "gender",
    "hair_color",
    "hair_style",
    "skin_color",
    "eye_color",
    "eye_expression",
    "background",
    "pose",
    "facial_features",
    "accessory",
    "race",
    "class",
    "experience",
    "race_features",
    "armor",
    "weapons",
    "accessories",
    "pronoun_subject",
    "pronoun_object",
    "pronoun_possessive",
    "pronoun_reflexive",
    "pronoun_subject_cap",
    "pronoun_object_cap",
    "pronoun_possessive_cap",
    "pronoun_reflexive_cap",
];

const BASE_FALLBACK: &str = "A {gender} character with {hair_color} {hair_style} hair, \
{skin_color} skin, and {eye_color} eyes with {eye_expression} expression. \
{pronoun_subject_cap} is {pose} in {environment}, {facial_features}. \
Art style: {artistic_style}.";

const ANIME_FALLBACK: &str = "An anime-style {gender} {species} with {hair_color} \
{hair_style} hair, {skin_color} skin, and {eye_color} eyes with {eye_expression} \
expression. {pronoun_subject_cap} has {species_features} and wears {clothing}. \
{pronoun_subject_cap} is {pose} against {background}, holding {cultural_artifact}. \
{facial_features}. Art style: {artistic_style}.";

const ALIEN_FALLBACK: &str = "A {gender} {species}, a {species_class} alien from a \
{climate} world. {pronoun_subject_cap} has {skin_color} skin, {hair_color} \
{hair_style}, and {eye_color} eyes with {eye_expression} expression. \
{pronoun_subject_cap} is known for being {positive_trait} but {negative_trait}. \
{pronoun_subject_cap} is {pose} in {environment}. Art style: {style}.";

const ADVENTURER_FALLBACK: &str = "A {gender} {race} {class} of {experience} \
experience. {pronoun_subject_cap} has {hair_color} {hair_style} hair, {skin_color} \
skin, and {eye_color} eyes. {race_features} {pronoun_subject_cap} wears {armor} and \
carries {weapons}, adorned with {accessories}. {pronoun_subject_cap} is {pose} \
against {background}.";

// ============================================================================
// Replacement Values
// ============================================================================

/// A substitution value: either a plain string or a list joined with ", ".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    Text(String),
    List(Vec<String>),
}

impl Replacement {
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(", "),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

impl From<String> for Replacement {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Replacement {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<String>> for Replacement {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Replacement map handed to [`render`].
pub type Replacements = HashMap<String, Replacement>;

// ============================================================================
// Rendering
// ============================================================================

/// Extract every `{token}` name occurring in a template, in order.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}

/// Derive pronoun entries from the map's `gender` value (default female)
/// and insert them, including capitalized variants. Existing entries are
/// not overwritten.
pub fn inject_pronouns(replacements: &mut Replacements) {
    let gender = replacements
        .get("gender")
        .map(|r| r.render())
        .unwrap_or_else(|| "female".to_string());
    let p = pronouns_for(&gender);

    let pairs: [(&str, String); 8] = [
        ("pronoun_subject", p.subject.to_string()),
        ("pronoun_object", p.object.to_string()),
        ("pronoun_possessive", p.possessive.to_string()),
        ("pronoun_reflexive", p.reflexive.to_string()),
        ("pronoun_subject_cap", Pronouns::capitalize(p.subject)),
        ("pronoun_object_cap", Pronouns::capitalize(p.object)),
        ("pronoun_possessive_cap", Pronouns::capitalize(p.possessive)),
        ("pronoun_reflexive_cap", Pronouns::capitalize(p.reflexive)),
    ];
    for (key, value) in pairs {
        replacements
            .entry(key.to_string())
            .or_insert(Replacement::Text(value));
    }
}

/// Substitute a replacement map into a template.
///
/// Tokens without a matching key pass through unreplaced. Pronoun tokens
/// are injected from `gender` before substitution.
pub fn render(template: &str, replacements: &Replacements) -> String {
    let mut resolved = replacements.clone();
    inject_pronouns(&mut resolved);

    PLACEHOLDER_RE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match resolved.get(&caps[1]) {
                Some(value) => value.render(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Validate a template against a generator type's placeholder whitelist.
///
/// Returns human-readable problems; an empty vec means the template is
/// valid.
pub fn validate_template(template: &str, generator_type: GeneratorType) -> Vec<String> {
    let mut errors = Vec::new();

    if template.trim().is_empty() {
        errors.push("Template must not be empty".to_string());
        return errors;
    }

    let whitelist = generator_type.placeholder_whitelist();
    for token in extract_placeholders(template) {
        if !whitelist.contains(&token.as_str()) {
            errors.push(format!(
                "Unknown placeholder '{{{token}}}' for generator type '{generator_type}'"
            ));
        }
    }

    errors
}
